//! Match/transition loop
//!
//! [`AstroTokenizer::tokenize_line`] walks one line with a cursor. While the top frame
//! has no embedded-language marker, the first rule of the top state that matches at
//! the cursor is applied; when nothing matches one character is consumed as
//! [`TokenClass::Default`]. While the top frame carries a marker, the text up to the
//! next structural rule of the top state is handed to that language's tokenizer and
//! the structural rule is applied afterwards.
//!
//! Rematches do not move the cursor. Pops always make progress because they shrink
//! the stack; every other rematch at the same cursor counts towards
//! [`MAX_STALLED_REMATCHES`], past which one character is consumed to force progress.

use crate::embedded::{EmbeddedState, LanguageRegistry, LanguageTokenizer, Registry};
use crate::grammar::{
    Embed, Grammar, LanguageRef, Rule, RuleMatch, TokenAction, Transition, ASTRO_GRAMMAR,
};
use crate::state::{EmbedKind, EmbeddedMarker, Frame, LineState, State};
use crate::token::{SpanBuilder, TokenClass, TokenSpan};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Rematches (and zero-width matches) allowed at one cursor position before the
/// engine consumes a character on its own.
pub const MAX_STALLED_REMATCHES: usize = 64;

/// Host-facing knobs of the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Language of front-matter, expressions and `<script>` bodies without a type.
    pub script_language: String,
    /// Language of `<style>` bodies without a type.
    pub style_language: String,
    /// Appended to markup scope names when rendered for a host.
    pub token_postfix: String,
}

impl TokenizerOptions {
    pub fn default_language(&self, kind: EmbedKind) -> &str {
        match kind {
            EmbedKind::Script => &self.script_language,
            EmbedKind::Style => &self.style_language,
        }
    }
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            script_language: "text/javascript".to_string(),
            style_language: "text/css".to_string(),
            token_postfix: ".astro".to_string(),
        }
    }
}

/// Result of tokenizing one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineTokens {
    pub spans: Vec<TokenSpan>,
    /// State to tokenize the next line with.
    pub end_state: LineState,
}

/// Line tokenizer for Astro components.
///
/// Cheap to clone and safe to share: the grammar and the registry are immutable
/// and every run owns its own [`LineState`].
#[derive(Clone)]
pub struct AstroTokenizer {
    grammar: Arc<Grammar>,
    registry: Arc<dyn LanguageRegistry>,
    options: TokenizerOptions,
}

impl AstroTokenizer {
    pub fn new(registry: Arc<dyn LanguageRegistry>) -> Self {
        Self {
            grammar: ASTRO_GRAMMAR.clone(),
            registry,
            options: TokenizerOptions::default(),
        }
    }

    /// Tokenizer backed by [`Registry::with_builtin_languages`].
    pub fn with_builtin_languages() -> Self {
        Self::new(Arc::new(Registry::with_builtin_languages()))
    }

    pub fn with_options(mut self, options: TokenizerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the built-in Astro rule table.
    pub fn with_grammar(mut self, grammar: Arc<Grammar>) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// State to tokenize the first line of a document with.
    pub fn initial_state(&self) -> LineState {
        LineState::new()
    }

    /// Classify `line` (without its line terminator) starting from `state`.
    pub fn tokenize_line(&self, line: &str, state: &LineState) -> LineTokens {
        LineRun::new(self, line, state.clone()).run()
    }

    /// Scope name of `class` as handed to hosts, with the configured postfix.
    pub fn scope<'c>(&self, class: &'c TokenClass) -> Cow<'c, str> {
        class.scope(&self.options.token_postfix)
    }
}

impl Default for AstroTokenizer {
    fn default() -> Self {
        Self::with_builtin_languages()
    }
}

impl fmt::Debug for AstroTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstroTokenizer")
            .field("states", &self.grammar.state_names().count())
            .field("options", &self.options)
            .finish()
    }
}

/// Lets an Astro document be embedded in another Astro-aware host.
impl LanguageTokenizer for AstroTokenizer {
    fn initial_state(&self) -> EmbeddedState {
        EmbeddedState::new(LineState::new())
    }

    fn tokenize_line(&self, line: &str, state: &EmbeddedState) -> (Vec<TokenSpan>, EmbeddedState) {
        let state = state.downcast_ref::<LineState>().cloned().unwrap_or_default();
        let LineTokens { spans, end_state } = AstroTokenizer::tokenize_line(self, line, &state);
        (spans, EmbeddedState::new(end_state))
    }
}

/// One pass over one line.
struct LineRun<'a> {
    grammar: &'a Grammar,
    registry: &'a dyn LanguageRegistry,
    options: &'a TokenizerOptions,
    line: &'a str,
    state: LineState,
    builder: SpanBuilder,
    cursor: usize,
    stalled: usize,
}

impl<'a> LineRun<'a> {
    fn new(tokenizer: &'a AstroTokenizer, line: &'a str, state: LineState) -> Self {
        Self {
            grammar: &tokenizer.grammar,
            registry: tokenizer.registry.as_ref(),
            options: &tokenizer.options,
            line,
            state,
            builder: SpanBuilder::new(),
            cursor: 0,
            stalled: 0,
        }
    }

    fn run(mut self) -> LineTokens {
        while self.cursor < self.line.len() {
            if self.stalled > MAX_STALLED_REMATCHES {
                trace!(cursor = self.cursor, state = %self.state, "no progress, consuming one character");
                self.fallback();
            } else if self.state.top().embedded.is_some() {
                self.step_embedded();
            } else {
                self.step();
            }
        }

        let mut end_state = self.state;
        end_state.leave_document_start();
        LineTokens {
            spans: self.builder.finish(self.line.len()),
            end_state,
        }
    }

    /// First rule of the top state matching at the cursor.
    fn step(&mut self) {
        let grammar = self.grammar;
        let document_start = self.state.is_document_start();
        let found = grammar
            .rules(self.state.current().name())
            .iter()
            .find_map(|rule| {
                rule.match_at(self.line, self.cursor, document_start)
                    .map(|found| (rule, found))
            });

        match found {
            Some((rule, found)) => self.apply(rule, found),
            None => self.fallback(),
        }
    }

    /// Delegate up to the earliest structural rule of the top state, then apply it.
    fn step_embedded(&mut self) {
        let grammar = self.grammar;
        let document_start = self.state.is_document_start();
        let next = grammar
            .rules(self.state.current().name())
            .iter()
            .filter(|rule| rule.is_structural())
            .filter_map(|rule| {
                rule.search_from(self.line, self.cursor, document_start)
                    .map(|found| (rule, found))
            })
            .min_by_key(|(_, found)| found.start);

        match next {
            Some((rule, found)) => {
                self.delegate(found.start);
                self.apply(rule, found);
            }
            None => self.delegate(self.line.len()),
        }
    }

    fn apply(&mut self, rule: &Rule, found: RuleMatch) {
        self.emit(rule.action(), &found);
        let shrank = self.transition(rule, &found);

        let consumed = !found.is_empty() && *rule.action() != TokenAction::Rematch;
        if consumed {
            self.advance(found.end);
        } else if !shrank {
            self.stalled += 1;
        }
    }

    fn emit(&mut self, action: &TokenAction, found: &RuleMatch) {
        match action {
            TokenAction::Class(class) => self.builder.produce(found.end, class.clone()),
            TokenAction::Groups(classes) => {
                for (index, class) in classes.iter().enumerate() {
                    if let Some(group) = found.group(index + 1) {
                        self.builder.produce(group.start, TokenClass::Default);
                        self.builder.produce(group.end, class.clone());
                    }
                }
                self.builder.produce(found.end, TokenClass::Default);
            }
            TokenAction::Rematch => {}
        }
    }

    /// Apply the rule's stack transition. Returns true when a frame was popped.
    fn transition(&mut self, rule: &Rule, found: &RuleMatch) -> bool {
        match rule.transition() {
            Transition::Stay => false,
            Transition::Push(target) => {
                let frame = self.frame(rule.embed(), target.resolve(self.line, found));
                self.state.push(frame);
                false
            }
            Transition::Switch(target) => {
                let frame = self.frame(rule.embed(), target.resolve(self.line, found));
                self.state.switch(frame);
                false
            }
            Transition::Pop => match self.state.pop() {
                Some(frame) => {
                    if let (Embed::Exit, Some(marker)) = (rule.embed(), &frame.embedded) {
                        debug!(language = %marker.language, "leaving embedded language");
                    }
                    true
                }
                None => false,
            },
        }
    }

    /// Frame for a pushed or switched-to state, with a fresh marker when the rule
    /// enters a language.
    fn frame(&self, embed: Embed, state: State) -> Frame {
        let language = match embed {
            Embed::Enter(language) => self.resolve_language(language),
            Embed::None | Embed::Exit => return Frame::new(state),
        };
        debug!(%language, %state, "entering embedded language");
        if !self.registry.has_language(&language) {
            debug!(%language, "no tokenizer registered, using plain text");
        }
        let tokenizer = self.registry.tokenizer(&language);
        Frame::embedding(
            state,
            EmbeddedMarker {
                language,
                state: tokenizer.initial_state(),
            },
        )
    }

    /// Language named by `language`, read from the state the rule belongs to.
    fn resolve_language(&self, language: LanguageRef) -> Arc<str> {
        match language {
            LanguageRef::Default(kind) => Arc::from(self.options.default_language(kind)),
            LanguageRef::StateArgument => Arc::from(self.state.current().argument().unwrap_or("")),
        }
    }

    /// Hand `cursor..end` to the top frame's language and store its new state.
    fn delegate(&mut self, end: usize) {
        if end <= self.cursor {
            return;
        }
        let marker = match &self.state.top().embedded {
            Some(marker) => marker.clone(),
            None => return,
        };

        let base = self.cursor;
        let segment = &self.line[base..end];
        let tokenizer = self.registry.tokenizer(&marker.language);
        let (spans, next) = tokenizer.tokenize_line(segment, &marker.state);

        for span in spans {
            let start = self.boundary(base + span.start.min(segment.len()));
            let stop = self.boundary(base + span.start.saturating_add(span.length).min(segment.len()));
            self.builder.produce(start, TokenClass::Default);
            self.builder.produce(stop, span.class);
        }
        self.builder.produce(end, TokenClass::Default);

        if let Some(marker) = &mut self.state.top_mut().embedded {
            marker.state = next;
        }
        self.advance(end);
    }

    /// Consume one character as default text.
    fn fallback(&mut self) {
        let next = self.line[self.cursor..]
            .chars()
            .next()
            .map_or(self.line.len(), |c| self.cursor + c.len_utf8());
        self.builder.produce(next, TokenClass::Default);
        self.advance(next);
    }

    fn advance(&mut self, to: usize) {
        self.cursor = to;
        self.stalled = 0;
    }

    /// Largest char boundary of the line at or before `offset`.
    fn boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.line.len());
        while !self.line.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

//! Declarative Grammar Table
//!
//! A grammar maps every [`StateName`] to an ordered list of rules. Each rule pairs a
//! regex with what to do when it matches at the cursor:
//!
//! - a token action: classify the match, classify each capture group, or rematch
//!   (apply the transition without consuming anything)
//! - a transition on the state stack: stay, push, pop or switch
//! - an embed action: hand classification to a sub-language, or leave it
//!
//! Rules are written as data with [`rule`] and compiled once with
//! [`Grammar::compile`], which validates the whole table up front. Order matters:
//! the first rule whose pattern matches at the cursor wins.

use crate::state::{EmbedKind, State, StateName};
use crate::token::TokenClass;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

pub mod astro;

pub use astro::{astro_rules, ASTRO_GRAMMAR};

/// Where in the document a rule may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Anywhere,
    /// Only at offset 0 of a line.
    LineStart,
    /// Only at offset 0 of the first line of the document.
    DocumentStart,
}

impl Anchor {
    fn permits(self, cursor: usize, document_start: bool) -> bool {
        match self {
            Anchor::Anywhere => true,
            Anchor::LineStart => cursor == 0,
            Anchor::DocumentStart => cursor == 0 && document_start,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenAction {
    /// Classify the whole match.
    Class(TokenClass),
    /// Classify capture group `i + 1` with the `i`th class. Text outside the groups
    /// is [`TokenClass::Default`].
    Groups(Vec<TokenClass>),
    /// Emit nothing, keep the cursor where it is and match again under the new state.
    Rematch,
}

/// State a push or switch leads to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    State(State),
    /// `RawCustomType(kind, text of capture group)`; group 0 is the whole match.
    CustomType(EmbedKind, usize),
}

impl From<State> for Target {
    fn from(state: State) -> Self {
        Target::State(state)
    }
}

impl Target {
    fn name(&self) -> StateName {
        match self {
            Target::State(state) => state.name(),
            Target::CustomType(kind, _) => StateName::RawCustomType(*kind),
        }
    }

    /// Instantiate the target state for a match of `line`.
    pub(crate) fn resolve(&self, line: &str, found: &RuleMatch) -> State {
        match self {
            Target::State(state) => state.clone(),
            Target::CustomType(kind, group) => {
                let captured = found.group(*group).map_or("", |range| &line[range]);
                State::RawCustomType(*kind, Arc::from(captured))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Stay,
    Push(Target),
    Pop,
    Switch(Target),
}

/// Which language a rule hands classification to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageRef {
    /// The configured default language for scripts or styles.
    Default(EmbedKind),
    /// The argument of the current parameterized state (a captured content type).
    StateArgument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embed {
    None,
    Enter(LanguageRef),
    Exit,
}

/// Uncompiled rule, built with [`rule`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    pattern: String,
    action: TokenAction,
    transition: Transition,
    embed: Embed,
    anchor: Anchor,
}

/// Start a rule for `pattern`. Without further calls it classifies the match as
/// [`TokenClass::Default`] and stays in the current state.
pub fn rule(pattern: impl Into<String>) -> RuleSpec {
    RuleSpec {
        pattern: pattern.into(),
        action: TokenAction::Class(TokenClass::Default),
        transition: Transition::Stay,
        embed: Embed::None,
        anchor: Anchor::Anywhere,
    }
}

impl RuleSpec {
    pub fn class(mut self, class: TokenClass) -> Self {
        self.action = TokenAction::Class(class);
        self
    }

    pub fn groups(mut self, classes: impl IntoIterator<Item = TokenClass>) -> Self {
        self.action = TokenAction::Groups(classes.into_iter().collect());
        self
    }

    pub fn rematch(mut self) -> Self {
        self.action = TokenAction::Rematch;
        self
    }

    pub fn push(mut self, target: impl Into<Target>) -> Self {
        self.transition = Transition::Push(target.into());
        self
    }

    pub fn pop(mut self) -> Self {
        self.transition = Transition::Pop;
        self
    }

    pub fn switch(mut self, target: impl Into<Target>) -> Self {
        self.transition = Transition::Switch(target.into());
        self
    }

    pub fn enter(mut self, language: LanguageRef) -> Self {
        self.embed = Embed::Enter(language);
        self
    }

    pub fn exit(mut self) -> Self {
        self.embed = Embed::Exit;
        self
    }

    pub fn at_line_start(mut self) -> Self {
        self.anchor = Anchor::LineStart;
        self
    }

    pub fn at_document_start(mut self) -> Self {
        self.anchor = Anchor::DocumentStart;
        self
    }
}

/// Absolute byte ranges of a match and of its capture groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub start: usize,
    pub end: usize,
    /// Index 0 is the whole match. Only filled for rules that read their groups.
    groups: Vec<Option<Range<usize>>>,
}

impl RuleMatch {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        if index == 0 {
            return Some(self.start..self.end);
        }
        self.groups.get(index).cloned().flatten()
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    /// `^(?:pattern)`, matched against the text from the cursor on.
    anchored: Regex,
    /// The bare pattern, used to look ahead for structural rules while a
    /// sub-language owns the text.
    search: Option<Regex>,
    needs_captures: bool,
    action: TokenAction,
    transition: Transition,
    embed: Embed,
    anchor: Anchor,
}

impl Rule {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn action(&self) -> &TokenAction {
        &self.action
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn embed(&self) -> Embed {
        self.embed
    }

    /// A rule that changes the stack or the embedding. While a sub-language owns
    /// the text these are the only rules the grammar keeps watching for.
    pub fn is_structural(&self) -> bool {
        self.transition != Transition::Stay || self.embed != Embed::None
    }

    /// Match at exactly `cursor`.
    pub(crate) fn match_at(
        &self,
        line: &str,
        cursor: usize,
        document_start: bool,
    ) -> Option<RuleMatch> {
        if !self.anchor.permits(cursor, document_start) {
            return None;
        }
        self.capture(&self.anchored, line, cursor)
    }

    /// Earliest match at or after `from`.
    pub(crate) fn search_from(
        &self,
        line: &str,
        from: usize,
        document_start: bool,
    ) -> Option<RuleMatch> {
        match (&self.search, self.anchor) {
            (Some(search), Anchor::Anywhere) => self.capture(search, line, from),
            _ => self.match_at(line, from, document_start),
        }
    }

    fn capture(&self, regex: &Regex, line: &str, offset: usize) -> Option<RuleMatch> {
        let rest = &line[offset..];
        if !self.needs_captures {
            let found = regex.find(rest)?;
            return Some(RuleMatch {
                start: offset + found.start(),
                end: offset + found.end(),
                groups: Vec::new(),
            });
        }

        let captures = regex.captures(rest)?;
        let whole = captures.get(0)?;
        let groups = captures
            .iter()
            .map(|group| group.map(|m| offset + m.start()..offset + m.end()))
            .collect();
        Some(RuleMatch {
            start: offset + whole.start(),
            end: offset + whole.end(),
            groups,
        })
    }
}

/// Errors found while compiling a rule table.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    InvalidPattern {
        state: StateName,
        pattern: String,
        message: String,
    },
    GroupCountMismatch {
        state: StateName,
        pattern: String,
        groups: usize,
        classes: usize,
    },
    MissingCaptureGroup {
        state: StateName,
        pattern: String,
        group: usize,
    },
    EnterWithoutPush {
        state: StateName,
        pattern: String,
    },
    ExitWithoutPop {
        state: StateName,
        pattern: String,
    },
    UnknownState {
        state: StateName,
        target: StateName,
    },
    EmptyState {
        state: StateName,
        target: StateName,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::InvalidPattern {
                state,
                pattern,
                message,
            } => write!(f, "Invalid pattern {:?} in state {}: {}", pattern, state, message),
            GrammarError::GroupCountMismatch {
                state,
                pattern,
                groups,
                classes,
            } => write!(
                f,
                "Pattern {:?} in state {} has {} capture groups but {} classes",
                pattern, state, groups, classes
            ),
            GrammarError::MissingCaptureGroup {
                state,
                pattern,
                group,
            } => write!(
                f,
                "Pattern {:?} in state {} has no capture group {}",
                pattern, state, group
            ),
            GrammarError::EnterWithoutPush { state, pattern } => write!(
                f,
                "Rule {:?} in state {} enters a language without pushing or switching state",
                pattern, state
            ),
            GrammarError::ExitWithoutPop { state, pattern } => write!(
                f,
                "Rule {:?} in state {} leaves a language without popping",
                pattern, state
            ),
            GrammarError::UnknownState { state, target } => {
                write!(f, "State {} transitions to undefined state {}", state, target)
            }
            GrammarError::EmptyState { state, target } => {
                write!(f, "State {} transitions to state {} which has no rules", state, target)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// A compiled, immutable rule table.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    states: HashMap<StateName, Vec<Rule>>,
}

impl Grammar {
    /// Compile and validate a rule table.
    pub fn compile<I>(definitions: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (StateName, Vec<RuleSpec>)>,
    {
        let mut states = HashMap::new();
        for (state, specs) in definitions {
            let rules = specs
                .into_iter()
                .map(|spec| compile_rule(state, spec))
                .collect::<Result<Vec<_>, _>>()?;
            states.insert(state, rules);
        }

        let grammar = Self { states };
        grammar.check_targets()?;
        Ok(grammar)
    }

    /// Rules of `state`, in declaration order. Unknown states have no rules.
    pub fn rules(&self, state: StateName) -> &[Rule] {
        self.states.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, state: StateName) -> bool {
        self.states.contains_key(&state)
    }

    pub fn state_names(&self) -> impl Iterator<Item = StateName> + '_ {
        self.states.keys().copied()
    }

    fn check_targets(&self) -> Result<(), GrammarError> {
        for (state, rules) in &self.states {
            for rule in rules {
                let target = match &rule.transition {
                    Transition::Push(target) | Transition::Switch(target) => target,
                    Transition::Stay | Transition::Pop => continue,
                };
                if !self.contains(target.name()) {
                    return Err(GrammarError::UnknownState {
                        state: *state,
                        target: target.name(),
                    });
                }
                if self.rules(target.name()).is_empty() {
                    return Err(GrammarError::EmptyState {
                        state: *state,
                        target: target.name(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn compile_rule(state: StateName, spec: RuleSpec) -> Result<Rule, GrammarError> {
    let RuleSpec {
        pattern,
        action,
        transition,
        embed,
        anchor,
    } = spec;
    let invalid = |error: regex::Error| GrammarError::InvalidPattern {
        state,
        pattern: pattern.clone(),
        message: error.to_string(),
    };
    let anchored = Regex::new(&format!("^(?:{})", pattern)).map_err(invalid)?;
    let group_count = anchored.captures_len() - 1;

    if let TokenAction::Groups(classes) = &action {
        if classes.len() != group_count {
            return Err(GrammarError::GroupCountMismatch {
                state,
                pattern: pattern.clone(),
                groups: group_count,
                classes: classes.len(),
            });
        }
    }

    let captured_group = match &transition {
        Transition::Push(Target::CustomType(_, group))
        | Transition::Switch(Target::CustomType(_, group)) => Some(*group),
        _ => None,
    };
    if let Some(group) = captured_group {
        if group > group_count {
            return Err(GrammarError::MissingCaptureGroup {
                state,
                pattern: pattern.clone(),
                group,
            });
        }
    }

    match embed {
        Embed::Enter(_) if !matches!(transition, Transition::Push(_) | Transition::Switch(_)) => {
            return Err(GrammarError::EnterWithoutPush {
                state,
                pattern: pattern.clone(),
            });
        }
        Embed::Exit if transition != Transition::Pop => {
            return Err(GrammarError::ExitWithoutPop {
                state,
                pattern: pattern.clone(),
            });
        }
        _ => {}
    }

    let structural = transition != Transition::Stay || embed != Embed::None;
    let search = if structural {
        Some(Regex::new(&pattern).map_err(invalid)?)
    } else {
        None
    };
    let needs_captures = matches!(action, TokenAction::Groups(_))
        || captured_group.map_or(false, |group| group > 0);

    Ok(Rule {
        pattern,
        anchored,
        search,
        needs_captures,
        action,
        transition,
        embed,
        anchor,
    })
}

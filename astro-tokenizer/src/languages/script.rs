//! JavaScript / TypeScript
//!
//! Keywords, identifiers, numbers, strings, template strings, comments, operators and
//! delimiters. Regular expression literals are not recognized; `/` is an operator.

use super::{block_comment_end, push_span};
use crate::embedded::{EmbeddedState, LanguageTokenizer};
use crate::token::TokenSpan;
use logos::Logos;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "break", "case", "catch", "class", "const",
    "continue", "debugger", "declare", "default", "delete", "do", "else", "enum", "export",
    "extends", "false", "finally", "for", "from", "function", "get", "if", "implements",
    "import", "in", "instanceof", "interface", "keyof", "let", "namespace", "new", "null",
    "of", "private", "protected", "public", "readonly", "return", "satisfies", "set",
    "static", "super", "switch", "this", "throw", "true", "try", "type", "typeof",
    "undefined", "var", "void", "while", "with", "yield",
];

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum ScriptToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    // The rest of the comment is scanned by hand so it can span lines
    #[token("/*")]
    BlockCommentStart,

    #[token("`")]
    TemplateStart,

    #[regex(r#""([^"\\\n]|\\.)*"?"#)]
    #[regex(r"'([^'\\\n]|\\.)*'?")]
    String,

    #[regex(r"[0-9][0-9_]*(\.[0-9_]+)?([eE][+-]?[0-9]+)?n?")]
    #[regex(r"0[xX][0-9a-fA-F_]+n?")]
    Number,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,

    #[regex(r"[+\-*%=<>!&|^~?:]+")]
    #[token("/")]
    Operator,

    #[regex(r"[{}()\[\];,.]")]
    Delimiter,
}

/// Line state of [`ScriptTokenizer`]: what the next line starts inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptState {
    #[default]
    Code,
    BlockComment,
    Template,
}

/// `logos`-driven lexer for script bodies, expressions and front-matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptTokenizer;

impl ScriptTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Spans of `line` plus the state the next line starts in.
    pub fn tokenize(&self, line: &str, mut state: ScriptState) -> (Vec<TokenSpan>, ScriptState) {
        let mut spans = Vec::new();
        let mut offset = 0;

        while offset < line.len() {
            match state {
                ScriptState::BlockComment => {
                    let end = block_comment_end(&line[offset..]).map(|end| offset + end);
                    push_span(&mut spans, offset..end.unwrap_or(line.len()), "comment.js");
                    offset = end.unwrap_or(line.len());
                    if end.is_some() {
                        state = ScriptState::Code;
                    }
                }
                ScriptState::Template => {
                    let end = template_end(&line[offset..]).map(|end| offset + end);
                    push_span(&mut spans, offset..end.unwrap_or(line.len()), "string.js");
                    offset = end.unwrap_or(line.len());
                    if end.is_some() {
                        state = ScriptState::Code;
                    }
                }
                ScriptState::Code => {
                    let (next_offset, next_state) = lex_code(line, offset, &mut spans);
                    offset = next_offset;
                    state = next_state;
                }
            }
        }

        (spans, state)
    }
}

/// Lex code from `offset` until the line ends or a multi-line construct opens.
fn lex_code(line: &str, offset: usize, spans: &mut Vec<TokenSpan>) -> (usize, ScriptState) {
    let mut lexer = ScriptToken::lexer(&line[offset..]);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let range = offset + range.start..offset + range.end;
        let token = match result {
            Ok(token) => token,
            Err(()) => continue,
        };

        let class = match token {
            ScriptToken::Whitespace => continue,
            ScriptToken::BlockCommentStart => {
                push_span(spans, range.clone(), "comment.js");
                return (range.end, ScriptState::BlockComment);
            }
            ScriptToken::TemplateStart => {
                push_span(spans, range.clone(), "string.js");
                return (range.end, ScriptState::Template);
            }
            ScriptToken::LineComment => "comment.js",
            ScriptToken::String => "string.js",
            ScriptToken::Number => "number.js",
            ScriptToken::Identifier if KEYWORDS.contains(&lexer.slice()) => "keyword.js",
            ScriptToken::Identifier => "identifier.js",
            ScriptToken::Operator => "delimiter.operator.js",
            ScriptToken::Delimiter => "delimiter.js",
        };
        push_span(spans, range, class);
    }

    (line.len(), ScriptState::Code)
}

/// Offset just past the closing backtick of a template string body.
fn template_end(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '`' => return Some(index + 1),
            _ => {}
        }
    }
    None
}

impl LanguageTokenizer for ScriptTokenizer {
    fn initial_state(&self) -> EmbeddedState {
        EmbeddedState::new(ScriptState::Code)
    }

    fn tokenize_line(&self, line: &str, state: &EmbeddedState) -> (Vec<TokenSpan>, EmbeddedState) {
        let state = state.downcast_ref::<ScriptState>().copied().unwrap_or_default();
        let (spans, next) = self.tokenize(line, state);
        (spans, EmbeddedState::new(next))
    }
}

//! CSS
//!
//! Selectors at the top level, property names and values inside blocks, at-rules,
//! numbers with units, colors, strings and comments.

use super::{block_comment_end, push_span};
use crate::embedded::{EmbeddedState, LanguageTokenizer};
use crate::token::TokenSpan;
use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum StyleToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[token("/*")]
    CommentStart,

    #[regex(r"@[A-Za-z\-]+")]
    AtKeyword,

    #[regex(r"#[0-9A-Za-z_\-]+")]
    Hash,

    #[regex(r"[+\-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)([A-Za-z]+|%)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*"?"#)]
    #[regex(r"'([^'\\\n]|\\.)*'?")]
    String,

    #[regex(r"-?-?[A-Za-z_][A-Za-z0-9_\-]*")]
    Ident,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[regex(r"[,>+~*()\[\]=.!/%&|^$]")]
    Punctuation,
}

/// Line state of [`StyleTokenizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleState {
    /// Inside an unterminated `/* ... */`.
    pub comment: bool,
    /// Block nesting depth.
    pub depth: u32,
    /// After a declaration's `:`, before its `;` or `}`.
    pub in_value: bool,
}

/// `logos`-driven lexer for `<style>` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleTokenizer;

impl StyleTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Spans of `line` plus the state the next line starts in.
    pub fn tokenize(&self, line: &str, mut state: StyleState) -> (Vec<TokenSpan>, StyleState) {
        let mut spans = Vec::new();
        let mut offset = 0;

        while offset < line.len() {
            if state.comment {
                let end = block_comment_end(&line[offset..]).map(|end| offset + end);
                push_span(&mut spans, offset..end.unwrap_or(line.len()), "comment.css");
                offset = end.unwrap_or(line.len());
                state.comment = end.is_none();
            } else {
                offset = lex_rules(line, offset, &mut state, &mut spans);
            }
        }

        (spans, state)
    }
}

/// Lex from `offset` until the line ends or a comment opens.
fn lex_rules(
    line: &str,
    offset: usize,
    state: &mut StyleState,
    spans: &mut Vec<TokenSpan>,
) -> usize {
    let mut lexer = StyleToken::lexer(&line[offset..]);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let range = offset + range.start..offset + range.end;
        let token = match result {
            Ok(token) => token,
            Err(()) => continue,
        };

        let class = match token {
            StyleToken::Whitespace => continue,
            StyleToken::CommentStart => {
                push_span(spans, range.clone(), "comment.css");
                state.comment = true;
                return range.end;
            }
            StyleToken::AtKeyword => "keyword.css",
            StyleToken::Hash if state.in_value => "attribute.value.hex.css",
            StyleToken::Hash => "tag.css",
            StyleToken::Number => "attribute.value.number.css",
            StyleToken::String => "string.css",
            StyleToken::Ident if state.in_value => "attribute.value.css",
            StyleToken::Ident if state.depth > 0 => "attribute.name.css",
            StyleToken::Ident => "tag.css",
            StyleToken::OpenBrace => {
                state.depth += 1;
                state.in_value = false;
                "delimiter.bracket.css"
            }
            StyleToken::CloseBrace => {
                state.depth = state.depth.saturating_sub(1);
                state.in_value = false;
                "delimiter.bracket.css"
            }
            StyleToken::Colon => {
                // `a:hover` at the top level is still a selector
                if state.depth > 0 {
                    state.in_value = true;
                }
                "delimiter.css"
            }
            StyleToken::Semicolon => {
                state.in_value = false;
                "delimiter.css"
            }
            StyleToken::Punctuation => "delimiter.css",
        };
        push_span(spans, range, class);
    }

    line.len()
}

impl LanguageTokenizer for StyleTokenizer {
    fn initial_state(&self) -> EmbeddedState {
        EmbeddedState::new(StyleState::default())
    }

    fn tokenize_line(&self, line: &str, state: &EmbeddedState) -> (Vec<TokenSpan>, EmbeddedState) {
        let state = state.downcast_ref::<StyleState>().copied().unwrap_or_default();
        let (spans, next) = self.tokenize(line, state);
        (spans, EmbeddedState::new(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::render;

    fn render_lines(lines: &[&str]) -> (Vec<String>, StyleState) {
        let tokenizer = StyleTokenizer::new();
        let mut state = StyleState::default();
        let mut rendered = Vec::new();
        for line in lines {
            let (spans, next) = tokenizer.tokenize(line, state);
            rendered.push(render(line, &spans));
            state = next;
        }
        (rendered, state)
    }

    #[test]
    fn test_rule_on_one_line() {
        let (rendered, state) = render_lines(&["h1 { color: red; }"]);
        assert_eq!(
            rendered[0],
            "[tag.css h1] [delimiter.bracket.css {] [attribute.name.css color][delimiter.css :] \
             [attribute.value.css red][delimiter.css ;] [delimiter.bracket.css }]"
        );
        assert_eq!(state, StyleState::default());
    }

    #[test]
    fn test_block_depth_carries_across_lines() {
        let (rendered, state) = render_lines(&[".card {", "  margin: 0 4px;", "  color: #fff"]);
        assert_eq!(
            rendered[0],
            "[delimiter.css .][tag.css card] [delimiter.bracket.css {]"
        );
        assert_eq!(
            rendered[1],
            "  [attribute.name.css margin][delimiter.css :] [attribute.value.number.css 0] \
             [attribute.value.number.css 4px][delimiter.css ;]"
        );
        assert_eq!(
            rendered[2],
            "  [attribute.name.css color][delimiter.css :] [attribute.value.hex.css #fff]"
        );
        assert_eq!(
            state,
            StyleState {
                comment: false,
                depth: 1,
                in_value: true,
            }
        );
    }

    #[test]
    fn test_comment_spans_lines() {
        let (rendered, state) = render_lines(&["a { /* one", "two */ }"]);
        assert_eq!(
            rendered[0],
            "[tag.css a] [delimiter.bracket.css {] [comment.css /* one]"
        );
        assert_eq!(rendered[1], "[comment.css two */] [delimiter.bracket.css }]");
        assert!(!state.comment);
        assert_eq!(state.depth, 0);
    }

    #[test]
    fn test_hover_selector_stays_selector() {
        let (rendered, _) = render_lines(&["a:hover {"]);
        assert_eq!(
            rendered[0],
            "[tag.css a][delimiter.css :][tag.css hover] [delimiter.bracket.css {]"
        );
    }
}

//! Testing utilities
//!
//! [`render`] turns a line and its spans into a compact string that reads well in
//! assertions and snapshots: `[class text]` for classified spans, `[text]` for
//! default spans and bare text for anything no span covers. [`assert_covers`]
//! checks the span invariants every tokenizer output must satisfy.
//!
//! [`TaggingRegistry`] stands in for real sub-languages when a test needs to see
//! which language classified which text: it labels every delegated segment with
//! `embedded.<language>` and counts the lines it saw in its state.

use crate::embedded::{EmbeddedState, LanguageRegistry, LanguageTokenizer};
use crate::token::{TokenClass, TokenSpan};
use std::fmt::Write;
use std::sync::Arc;

/// Render `spans` of `line` for comparison in tests.
pub fn render(line: &str, spans: &[TokenSpan]) -> String {
    let mut out = String::new();
    let mut position = 0;
    for span in spans {
        if span.start > position {
            out.push_str(&line[position..span.start]);
        }
        let text = span.text(line);
        if span.class == TokenClass::Default {
            let _ = write!(out, "[{}]", text);
        } else {
            let _ = write!(out, "[{} {}]", span.class, text);
        }
        position = span.end();
    }
    if position < line.len() {
        out.push_str(&line[position..]);
    }
    out
}

/// Assert that `spans` are ordered, contiguous, non-empty and cover `line` exactly.
#[track_caller]
pub fn assert_covers(line: &str, spans: &[TokenSpan]) {
    let mut position = 0;
    for span in spans {
        assert_eq!(
            span.start, position,
            "span {:?} does not start where the previous one ended in {:?}",
            span, line
        );
        assert!(span.length > 0, "empty span {:?} in {:?}", span, line);
        assert!(
            line.is_char_boundary(span.start) && line.is_char_boundary(span.end()),
            "span {:?} splits a character in {:?}",
            span,
            line
        );
        position = span.end();
    }
    assert_eq!(position, line.len(), "spans do not cover {:?}: {:?}", line, spans);
}

/// Registry whose tokenizers classify whole segments as `embedded.<language>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggingRegistry;

impl LanguageRegistry for TaggingRegistry {
    fn tokenizer(&self, language: &str) -> Arc<dyn LanguageTokenizer> {
        Arc::new(TaggingTokenizer {
            class: TokenClass::other(format!("embedded.{}", language)),
        })
    }
}

/// Number of segments a [`TaggingTokenizer`] has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenSegments(pub usize);

#[derive(Debug)]
struct TaggingTokenizer {
    class: TokenClass,
}

impl LanguageTokenizer for TaggingTokenizer {
    fn initial_state(&self) -> EmbeddedState {
        EmbeddedState::new(SeenSegments(0))
    }

    fn tokenize_line(&self, line: &str, state: &EmbeddedState) -> (Vec<TokenSpan>, EmbeddedState) {
        let seen = state.downcast_ref::<SeenSegments>().map_or(0, |seen| seen.0);
        let spans = vec![TokenSpan::new(0, line.len(), self.class.clone())];
        (spans, EmbeddedState::new(SeenSegments(seen + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_gaps_and_defaults() {
        let spans = vec![
            TokenSpan::new(0, 1, TokenClass::Delimiter),
            TokenSpan::new(2, 1, TokenClass::Default),
        ];
        assert_eq!(render("<a b", &spans), "[delimiter <]a[ ]b");
    }

    #[test]
    #[should_panic(expected = "do not cover")]
    fn test_assert_covers_rejects_short_spans() {
        assert_covers("abc", &[TokenSpan::new(0, 2, TokenClass::Default)]);
    }

    #[test]
    fn test_tagging_registry_counts_segments() {
        let tokenizer = TaggingRegistry.tokenizer("text/x");
        let (spans, state) = tokenizer.tokenize_line("ab", &tokenizer.initial_state());

        assert_eq!(spans[0].class.as_str(), "embedded.text/x");
        assert_eq!(state.downcast_ref::<SeenSegments>(), Some(&SeenSegments(1)));
    }
}

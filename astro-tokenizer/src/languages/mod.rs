//! Bundled sub-language tokenizers
//!
//! Small `logos` lexers for the languages an Astro component embeds by default. They
//! classify well enough for highlighting and carry multi-line constructs (block
//! comments, template strings) in their own line state. Hosts with real grammars for
//! these languages register them in the [`Registry`](crate::embedded::Registry)
//! instead.

mod script;
mod style;

pub use script::{ScriptState, ScriptTokenizer};
pub use style::{StyleState, StyleTokenizer};

use crate::token::{TokenClass, TokenSpan};
use std::ops::Range;

/// Append a span, extending the previous one when it has the same class and ends
/// where this one starts.
fn push_span(spans: &mut Vec<TokenSpan>, range: Range<usize>, class: &'static str) {
    if range.is_empty() {
        return;
    }
    let class = TokenClass::other(class);
    match spans.last_mut() {
        Some(last) if last.end() == range.start && last.class == class => {
            last.length += range.len();
        }
        _ => spans.push(TokenSpan::new(range.start, range.len(), class)),
    }
}

/// Offset just past the first `*/` in `text`.
fn block_comment_end(text: &str) -> Option<usize> {
    text.find("*/").map(|index| index + 2)
}

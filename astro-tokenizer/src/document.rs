//! Whole-document helpers
//!
//! Hosts usually drive [`AstroTokenizer::tokenize_line`] themselves. These helpers
//! cover the two common cases: tokenizing a complete text, and keeping a tokenized
//! document current while lines are edited.

use crate::engine::{AstroTokenizer, LineTokens};
use crate::state::LineState;
use crate::token::TokenSpan;
use tracing::trace;

/// Split `text` into lines, dropping the `\n` terminators and a `\r` before them.
///
/// A trailing newline produces a final empty line, the way editors count lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Tokenize every line of `text` from the initial state.
pub fn tokenize_document(tokenizer: &AstroTokenizer, text: &str) -> DocumentTokens {
    DocumentTokens::new(tokenizer, split_lines(text))
}

/// Per-line tokens of a document, with the state each line ended in.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTokens {
    text: Vec<String>,
    lines: Vec<LineTokens>,
}

impl DocumentTokens {
    pub fn new<I, S>(tokenizer: &AstroTokenizer, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let text: Vec<String> = lines.into_iter().map(Into::into).collect();
        let mut state = tokenizer.initial_state();
        let mut tokens = Vec::with_capacity(text.len());
        for line in &text {
            let result = tokenizer.tokenize_line(line, &state);
            state = result.end_state.clone();
            tokens.push(result);
        }
        Self {
            text,
            lines: tokens,
        }
    }

    pub fn lines(&self) -> &[LineTokens] {
        &self.lines
    }

    pub fn spans(&self, index: usize) -> Option<&[TokenSpan]> {
        self.lines.get(index).map(|line| line.spans.as_slice())
    }

    /// Source text of line `index`.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.text.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// State after the last line.
    pub fn end_state(&self) -> Option<&LineState> {
        self.lines.last().map(|line| &line.end_state)
    }

    /// Replace `removed` lines starting at `start` with `inserted`, and re-tokenize.
    ///
    /// Inserted lines are always tokenized. Lines after the edit are tokenized until
    /// one is reached with the same incoming state as before the edit; from there on
    /// the cached tokens are still valid. Returns the number of lines tokenized.
    pub fn update_lines<I, S>(
        &mut self,
        tokenizer: &AstroTokenizer,
        start: usize,
        removed: usize,
        inserted: I,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = start.min(self.text.len());
        let end = start.saturating_add(removed).min(self.text.len());
        let inserted: Vec<String> = inserted.into_iter().map(Into::into).collect();
        let inserted_len = inserted.len();

        let mut cached_incoming = match end {
            0 => tokenizer.initial_state(),
            _ => self.lines[end - 1].end_state.clone(),
        };
        let mut state = match start {
            0 => tokenizer.initial_state(),
            _ => self.lines[start - 1].end_state.clone(),
        };

        self.text.splice(start..end, inserted);
        let tail = self.lines.split_off(end);
        self.lines.truncate(start);

        let mut tokenized = 0;
        for line in &self.text[start..start + inserted_len] {
            let result = tokenizer.tokenize_line(line, &state);
            state = result.end_state.clone();
            self.lines.push(result);
            tokenized += 1;
        }

        let mut tail = tail.into_iter();
        while let Some(cached) = tail.next() {
            if state == cached_incoming {
                trace!(line = self.lines.len(), "state unchanged, reusing cached tokens");
                self.lines.push(cached);
                self.lines.extend(tail);
                break;
            }
            let line = &self.text[self.lines.len()];
            let result = tokenizer.tokenize_line(line, &state);
            cached_incoming = cached.end_state;
            state = result.end_state.clone();
            self.lines.push(result);
            tokenized += 1;
        }

        tokenized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_strips_carriage_returns() {
        assert_eq!(split_lines("a\r\nb\n"), vec!["a", "b", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_tokenize_document_threads_state() {
        let tokenizer = AstroTokenizer::default();
        let document = tokenize_document(&tokenizer, "<!--\nhidden\n-->\n<p>");

        assert_eq!(document.len(), 4);
        assert!(!document.lines()[0].end_state.is_root());
        assert!(!document.lines()[1].end_state.is_root());
        assert!(document.lines()[2].end_state.is_root());
        assert_eq!(document.text(3), Some("<p>"));
        assert!(document.end_state().map_or(false, LineState::is_root));
    }

    #[test]
    fn test_update_stops_when_state_converges() {
        let tokenizer = AstroTokenizer::default();
        let mut document = tokenize_document(&tokenizer, "<p>\n<b>\n<i>\n<u>");

        let tokenized = document.update_lines(&tokenizer, 1, 1, ["<em>"]);
        assert_eq!(tokenized, 1);
        assert_eq!(document.len(), 4);
        assert_eq!(document.text(1), Some("<em>"));
    }

    #[test]
    fn test_update_propagates_state_changes() {
        let tokenizer = AstroTokenizer::default();
        let mut document = tokenize_document(&tokenizer, "<p>\na\nb\n-->\nc");

        let tokenized = document.update_lines(&tokenizer, 0, 1, ["<!--"]);
        assert_eq!(tokenized, 4);
        assert!(!document.lines()[2].end_state.is_root());
        assert!(document.lines()[3].end_state.is_root());

        let fresh = tokenize_document(&tokenizer, "<!--\na\nb\n-->\nc");
        assert_eq!(document, fresh);
    }

    #[test]
    fn test_update_removes_lines() {
        let tokenizer = AstroTokenizer::default();
        let mut document = tokenize_document(&tokenizer, "<!--\na\n-->\nb");

        document.update_lines(&tokenizer, 0, 3, Vec::<String>::new());
        assert_eq!(document, tokenize_document(&tokenizer, "b"));
    }
}

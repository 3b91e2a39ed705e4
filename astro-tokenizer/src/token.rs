//! Token classes and spans
//!
//! A tokenized line is a list of [`TokenSpan`]s. Spans are expressed in UTF-8 byte
//! offsets relative to the start of the line, are contiguous, never overlap, and
//! together cover the whole line. [`SpanBuilder`] is the only way the engine produces
//! spans, so those properties hold by construction.

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

/// Classification of a span of text.
///
/// The markup-level classes mirror the token types host editors already theme
/// (`delimiter`, `tag`, `attribute.name`, ...). Classes reported by embedded
/// sub-languages are carried verbatim in [`TokenClass::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// No visible class: plain text, whitespace, unmatched characters.
    Default,
    MetaTag,
    MetaTagContent,
    Comment,
    CommentContent,
    Delimiter,
    Tag,
    AttributeName,
    AttributeValue,
    /// A class produced by an embedded sub-language tokenizer.
    Other(Cow<'static, str>),
}

impl TokenClass {
    /// Build a class for a sub-language token type.
    pub fn other(name: impl Into<Cow<'static, str>>) -> Self {
        TokenClass::Other(name.into())
    }

    /// Returns the token type string handed to host editors.
    pub fn as_str(&self) -> &str {
        match self {
            TokenClass::Default => "",
            TokenClass::MetaTag => "metatag",
            TokenClass::MetaTagContent => "metatag.content",
            TokenClass::Comment => "comment",
            TokenClass::CommentContent => "comment.content",
            TokenClass::Delimiter => "delimiter",
            TokenClass::Tag => "tag",
            TokenClass::AttributeName => "attribute.name",
            TokenClass::AttributeValue => "attribute.value",
            TokenClass::Other(name) => name,
        }
    }

    /// True for the classes produced by the markup grammar itself.
    pub fn is_markup(&self) -> bool {
        !matches!(self, TokenClass::Default | TokenClass::Other(_))
    }

    /// Returns the scope name with `postfix` appended to markup classes
    /// (`delimiter` becomes `delimiter.astro`). Default and sub-language classes
    /// are returned unchanged.
    pub fn scope(&self, postfix: &str) -> Cow<'_, str> {
        if self.is_markup() && !postfix.is_empty() {
            Cow::Owned(format!("{}{}", self.as_str(), postfix))
        } else {
            Cow::Borrowed(self.as_str())
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A classified run of text within one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    pub start: usize,
    pub length: usize,
    pub class: TokenClass,
}

impl TokenSpan {
    pub fn new(start: usize, length: usize, class: TokenClass) -> Self {
        Self {
            start,
            length,
            class,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// The slice of `line` this span covers.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.range()]
    }
}

/// Accumulates the spans of one line.
///
/// Every call to [`SpanBuilder::produce`] covers the text from the current position
/// up to `end`; empty or backwards requests are ignored and a span of the same class
/// as its predecessor extends it instead of starting a new one.
#[derive(Debug, Clone, Default)]
pub struct SpanBuilder {
    spans: Vec<TokenSpan>,
    position: usize,
}

impl SpanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset up to which spans have been produced.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn produce(&mut self, end: usize, class: TokenClass) {
        if end <= self.position {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.class == class => last.length += end - self.position,
            _ => self.spans.push(TokenSpan::new(
                self.position,
                end - self.position,
                class,
            )),
        }
        self.position = end;
    }

    /// Fill whatever is left up to `line_len` with [`TokenClass::Default`] and
    /// return the spans.
    pub fn finish(mut self, line_len: usize) -> Vec<TokenSpan> {
        self.produce(line_len, TokenClass::Default);
        self.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produce_merges_same_class() {
        let mut builder = SpanBuilder::new();
        builder.produce(2, TokenClass::Delimiter);
        builder.produce(4, TokenClass::Delimiter);
        builder.produce(7, TokenClass::Tag);

        assert_eq!(
            builder.finish(7),
            vec![
                TokenSpan::new(0, 4, TokenClass::Delimiter),
                TokenSpan::new(4, 3, TokenClass::Tag),
            ]
        );
    }

    #[test]
    fn test_produce_ignores_backwards_requests() {
        let mut builder = SpanBuilder::new();
        builder.produce(3, TokenClass::Tag);
        builder.produce(1, TokenClass::Delimiter);
        builder.produce(3, TokenClass::Delimiter);

        assert_eq!(builder.position(), 3);
        assert_eq!(builder.finish(3), vec![TokenSpan::new(0, 3, TokenClass::Tag)]);
    }

    #[test]
    fn test_finish_fills_remaining_text() {
        let mut builder = SpanBuilder::new();
        builder.produce(1, TokenClass::Delimiter);

        let spans = builder.finish(5);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1], TokenSpan::new(1, 4, TokenClass::Default));
    }

    #[test]
    fn test_finish_on_empty_line() {
        assert!(SpanBuilder::new().finish(0).is_empty());
    }

    #[test]
    fn test_scope_postfix_only_on_markup() {
        assert_eq!(TokenClass::Delimiter.scope(".astro"), "delimiter.astro");
        assert_eq!(TokenClass::Default.scope(".astro"), "");
        assert_eq!(TokenClass::other("keyword.js").scope(".astro"), "keyword.js");
    }

    #[test]
    fn test_span_text() {
        let span = TokenSpan::new(1, 3, TokenClass::Tag);
        assert_eq!(span.text("<div>"), "div");
        assert_eq!(span.end(), 4);
    }
}

//! Grammar states and the line resumption state
//!
//! [`LineState`] is everything needed to tokenize the next line: the stack of active
//! grammar states, the embedded-language markers attached to them, and whether the
//! next line is the first line of the document. The stack is never empty and its
//! bottom frame is always [`State::Root`].

use crate::embedded::EmbeddedState;
use std::fmt;
use std::sync::Arc;

/// The two raw-text element families that embed another language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedKind {
    Script,
    Style,
}

impl EmbedKind {
    pub fn tag_name(self) -> &'static str {
        match self {
            EmbedKind::Script => "script",
            EmbedKind::Style => "style",
        }
    }
}

/// A grammar state. `RawCustomType` carries the content type captured from the
/// element's `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum State {
    Root,
    Doctype,
    Comment,
    FrontmatterHeader,
    FrontmatterBody,
    ExpressionHeader,
    ExpressionBody,
    TagBody,
    RawTag(EmbedKind),
    RawAfterType(EmbedKind),
    RawAfterTypeEquals(EmbedKind),
    RawCustomType(EmbedKind, Arc<str>),
    RawBody(EmbedKind),
}

/// Payload-free key of a [`State`], used to look up its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateName {
    Root,
    Doctype,
    Comment,
    FrontmatterHeader,
    FrontmatterBody,
    ExpressionHeader,
    ExpressionBody,
    TagBody,
    RawTag(EmbedKind),
    RawAfterType(EmbedKind),
    RawAfterTypeEquals(EmbedKind),
    RawCustomType(EmbedKind),
    RawBody(EmbedKind),
}

impl State {
    pub fn name(&self) -> StateName {
        match self {
            State::Root => StateName::Root,
            State::Doctype => StateName::Doctype,
            State::Comment => StateName::Comment,
            State::FrontmatterHeader => StateName::FrontmatterHeader,
            State::FrontmatterBody => StateName::FrontmatterBody,
            State::ExpressionHeader => StateName::ExpressionHeader,
            State::ExpressionBody => StateName::ExpressionBody,
            State::TagBody => StateName::TagBody,
            State::RawTag(kind) => StateName::RawTag(*kind),
            State::RawAfterType(kind) => StateName::RawAfterType(*kind),
            State::RawAfterTypeEquals(kind) => StateName::RawAfterTypeEquals(*kind),
            State::RawCustomType(kind, _) => StateName::RawCustomType(*kind),
            State::RawBody(kind) => StateName::RawBody(*kind),
        }
    }

    /// The captured string a parameterized state was instantiated with.
    pub fn argument(&self) -> Option<&str> {
        match self {
            State::RawCustomType(_, content_type) => Some(content_type.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (family, kind) = match self {
            StateName::Root => return f.write_str("root"),
            StateName::Doctype => return f.write_str("doctype"),
            StateName::Comment => return f.write_str("comment"),
            StateName::FrontmatterHeader => return f.write_str("frontmatterHeader"),
            StateName::FrontmatterBody => return f.write_str("frontmatterBody"),
            StateName::ExpressionHeader => return f.write_str("expressionHeader"),
            StateName::ExpressionBody => return f.write_str("expressionBody"),
            StateName::TagBody => return f.write_str("tagBody"),
            StateName::RawTag(kind) => ("", kind),
            StateName::RawAfterType(kind) => ("AfterType", kind),
            StateName::RawAfterTypeEquals(kind) => ("AfterTypeEquals", kind),
            StateName::RawCustomType(kind) => ("WithCustomType", kind),
            StateName::RawBody(kind) => ("Embedded", kind),
        };
        write!(f, "{}{}", kind.tag_name(), family)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(argument) => write!(f, "{}.{}", self.name(), argument),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Records which sub-language owns classification for a frame, and that
/// sub-language's own resumption state.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedMarker {
    pub language: Arc<str>,
    pub state: EmbeddedState,
}

/// One entry of the state stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub state: State,
    pub embedded: Option<EmbeddedMarker>,
}

impl Frame {
    pub fn new(state: State) -> Self {
        Self {
            state,
            embedded: None,
        }
    }

    pub fn embedding(state: State, marker: EmbeddedMarker) -> Self {
        Self {
            state,
            embedded: Some(marker),
        }
    }
}

/// Snapshot carried from one line to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct LineState {
    frames: Vec<Frame>,
    document_start: bool,
}

impl LineState {
    /// The state before the first line of a document.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(State::Root)],
            document_start: true,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.frames.iter().map(|frame| &frame.state)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> &Frame {
        // The root frame is never removed
        &self.frames[self.frames.len() - 1]
    }

    pub(crate) fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// The state governing the next match.
    pub fn current(&self) -> &State {
        &self.top().state
    }

    /// True when only the root frame is active.
    pub fn is_root(&self) -> bool {
        self.frames.len() == 1
    }

    pub fn is_document_start(&self) -> bool {
        self.document_start
    }

    /// Language owning classification right now, if any.
    pub fn embedded_language(&self) -> Option<&str> {
        self.top()
            .embedded
            .as_ref()
            .map(|marker| marker.language.as_ref())
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Remove the top frame. Returns `None` and leaves the stack untouched when
    /// only the root frame is left.
    pub(crate) fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Replace the top frame. The root frame is kept, so switching away from a
    /// root-only stack pushes instead.
    pub(crate) fn switch(&mut self, frame: Frame) {
        if self.frames.len() > 1 {
            *self.top_mut() = frame;
        } else {
            self.frames.push(frame);
        }
    }

    pub(crate) fn leave_document_start(&mut self) {
        self.document_start = false;
    }
}

impl Default for LineState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, frame) in self.frames.iter().enumerate() {
            if index > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", frame.state)?;
            if let Some(marker) = &frame.embedded {
                write!(f, "[{}]", marker.language)?;
            }
        }
        Ok(())
    }
}

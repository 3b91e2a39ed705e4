//! Sub-language delegation contract
//!
//! Embedded regions are tokenized by independent tokenizers that implement the same
//! line contract as the Astro tokenizer itself: an initial state, and a function from
//! (line, state) to (spans, state). The engine only sees them through
//! [`LanguageRegistry`], and their states only as opaque [`EmbeddedState`] values.

use crate::languages::{ScriptTokenizer, StyleTokenizer};
use crate::token::{TokenClass, TokenSpan};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Object-safe view of a sub-language state.
pub trait OpaqueState: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_state(&self, other: &dyn OpaqueState) -> bool;
}

impl<T> OpaqueState for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_state(&self, other: &dyn OpaqueState) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

/// Resumption state of a sub-language, shared cheaply between line states.
#[derive(Clone)]
pub struct EmbeddedState(Arc<dyn OpaqueState>);

impl EmbeddedState {
    pub fn new<T>(state: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Self(Arc::new(state))
    }

    /// The concrete state, if it was created by the tokenizer expecting `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for EmbeddedState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_state(other.0.as_ref())
    }
}

impl fmt::Debug for EmbeddedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

/// A line tokenizer for one language.
///
/// Spans are relative to `line`. The engine clamps and gap-fills whatever an
/// implementation returns, so a misbehaving tokenizer cannot break span coverage.
pub trait LanguageTokenizer: Send + Sync {
    fn initial_state(&self) -> EmbeddedState;

    fn tokenize_line(&self, line: &str, state: &EmbeddedState) -> (Vec<TokenSpan>, EmbeddedState);
}

/// Resolves language identifiers to tokenizers. Lookups never fail: unknown
/// identifiers get a tokenizer that leaves text unclassified.
pub trait LanguageRegistry: Send + Sync {
    fn tokenizer(&self, language: &str) -> Arc<dyn LanguageTokenizer>;

    /// False when `language` resolves to the plain-text fallback.
    fn has_language(&self, _language: &str) -> bool {
        true
    }
}

/// Leaves all text as [`TokenClass::Default`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl LanguageTokenizer for PlainText {
    fn initial_state(&self) -> EmbeddedState {
        EmbeddedState::new(())
    }

    fn tokenize_line(&self, line: &str, state: &EmbeddedState) -> (Vec<TokenSpan>, EmbeddedState) {
        let spans = if line.is_empty() {
            Vec::new()
        } else {
            vec![TokenSpan::new(0, line.len(), TokenClass::Default)]
        };
        (spans, state.clone())
    }
}

/// Map from language identifiers (and aliases such as MIME types) to tokenizers.
///
/// Identifiers are matched case-insensitively, ignoring surrounding whitespace.
#[derive(Clone, Default)]
pub struct Registry {
    languages: HashMap<String, Arc<dyn LanguageTokenizer>>,
    aliases: HashMap<String, String>,
    plain: Arc<PlainText>,
}

const SCRIPT_ALIASES: &[&str] = &[
    "js",
    "jsx",
    "ts",
    "tsx",
    "typescript",
    "module",
    "text/javascript",
    "text/typescript",
    "application/javascript",
    "application/x-javascript",
    "application/typescript",
];

const STYLE_ALIASES: &[&str] = &["text/css", "scss", "text/scss", "less", "text/less"];

impl Registry {
    /// An empty registry: every language resolves to [`PlainText`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled `javascript` and `css` tokenizers and their
    /// usual aliases.
    pub fn with_builtin_languages() -> Self {
        let mut registry = Self::new();
        registry.register("javascript", Arc::new(ScriptTokenizer::new()));
        registry.register("css", Arc::new(StyleTokenizer::new()));
        for alias in SCRIPT_ALIASES {
            registry.alias(alias, "javascript");
        }
        for alias in STYLE_ALIASES {
            registry.alias(alias, "css");
        }
        registry
    }

    pub fn register(
        &mut self,
        language: impl AsRef<str>,
        tokenizer: Arc<dyn LanguageTokenizer>,
    ) -> &mut Self {
        self.languages
            .insert(normalize(language.as_ref()), tokenizer);
        self
    }

    /// Make `alias` resolve to whatever `language` resolves to.
    pub fn alias(&mut self, alias: impl AsRef<str>, language: impl AsRef<str>) -> &mut Self {
        self.aliases
            .insert(normalize(alias.as_ref()), normalize(language.as_ref()));
        self
    }

    /// The tokenizer registered for `language`, following one level of aliasing.
    pub fn get(&self, language: &str) -> Option<Arc<dyn LanguageTokenizer>> {
        let key = normalize(language);
        self.languages
            .get(&key)
            .or_else(|| {
                self.aliases
                    .get(&key)
                    .and_then(|target| self.languages.get(target))
            })
            .cloned()
    }

    pub fn contains(&self, language: &str) -> bool {
        self.get(language).is_some()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }
}

impl LanguageRegistry for Registry {
    fn tokenizer(&self, language: &str) -> Arc<dyn LanguageTokenizer> {
        match self.get(language) {
            Some(tokenizer) => tokenizer,
            None => {
                let plain: Arc<dyn LanguageTokenizer> = self.plain.clone();
                plain
            }
        }
    }

    fn has_language(&self, language: &str) -> bool {
        self.contains(language)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut languages: Vec<&str> = self.languages().collect();
        languages.sort_unstable();
        f.debug_struct("Registry")
            .field("languages", &languages)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

fn normalize(language: &str) -> String {
    language.trim().to_ascii_lowercase()
}

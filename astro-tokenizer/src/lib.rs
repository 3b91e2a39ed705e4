//! # astro-tokenizer
//!
//! Line-oriented syntax highlighting tokenizer for Astro components: HTML-like markup
//! with a `---` front-matter block, `{...}` expressions and `<script>` / `<style>`
//! elements whose bodies belong to other languages.
//!
//! The tokenizer is a table-driven state machine. A host feeds it one line at a time
//! together with the state the previous line ended in, and gets back classified
//! spans covering the line plus the state for the next line:
//!
//! ```rust,ignore
//! use astro_tokenizer::AstroTokenizer;
//!
//! let tokenizer = AstroTokenizer::with_builtin_languages();
//! let mut state = tokenizer.initial_state();
//! for line in source.lines() {
//!     let tokens = tokenizer.tokenize_line(line, &state);
//!     paint(line, &tokens.spans);
//!     state = tokens.end_state;
//! }
//! ```
//!
//! Layout
//!
//!     - [`token`]: classes and spans
//!     - [`state`]: grammar states and the line resumption state
//!     - [`grammar`]: the rule table format and the Astro rules
//!     - [`engine`]: the match/transition loop
//!     - [`embedded`]: the contract for sub-language tokenizers and their registry
//!     - [`languages`]: bundled script and style tokenizers
//!     - [`document`]: whole-document and incremental helpers
//!
//! Tokenizing never fails. Malformed input still produces spans covering every line.

pub mod document;
pub mod embedded;
pub mod engine;
pub mod grammar;
pub mod languages;
pub mod state;
pub mod testing;
pub mod token;

pub use document::{split_lines, tokenize_document, DocumentTokens};
pub use embedded::{EmbeddedState, LanguageRegistry, LanguageTokenizer, PlainText, Registry};
pub use engine::{AstroTokenizer, LineTokens, TokenizerOptions, MAX_STALLED_REMATCHES};
pub use grammar::{Grammar, GrammarError, ASTRO_GRAMMAR};
pub use state::{EmbedKind, LineState, State};
pub use token::{TokenClass, TokenSpan};

//! Configuration for Astro highlighting.
//!
//! `defaults/astro.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`AstroConfig`].
//!
//! The `[language]` table is the registration surface a host editor needs besides
//! the tokenizer itself: comment delimiters, bracket and auto-closing pairs,
//! folding markers and void elements. The `[tokenizer]` table becomes the
//! tokenizer's [`TokenizerOptions`].

use astro_tokenizer::TokenizerOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/astro.default.toml");

/// Top-level configuration consumed by Astro highlighting hosts.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AstroConfig {
    pub language: LanguageConfiguration,
    pub tokenizer: TokenizerConfig,
}

impl AstroConfig {
    pub fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions::from(&self.tokenizer)
    }
}

/// Static editor data for the language.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LanguageConfiguration {
    pub comments: CommentConfig,
    pub brackets: Vec<[String; 2]>,
    pub auto_closing_pairs: Vec<AutoClosingPair>,
    /// Characters that may follow the cursor for auto-closing to kick in.
    pub auto_close_before: String,
    pub surrounding_pairs: Vec<SurroundingPair>,
    pub folding: FoldingMarkers,
    pub void_elements: Vec<String>,
}

impl LanguageConfiguration {
    /// True for elements such as `br` or `img` that never have a closing tag.
    pub fn is_void_element(&self, name: &str) -> bool {
        self.void_elements
            .iter()
            .any(|element| element.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommentConfig {
    pub block_comment: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutoClosingPair {
    pub open: String,
    pub close: String,
    /// Token scopes (`string`, `comment`) in which the pair is not closed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_in: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SurroundingPair {
    pub open: String,
    pub close: String,
}

/// Regexes for lines that open and close a foldable region.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FoldingMarkers {
    pub start: String,
    pub end: String,
}

impl FoldingMarkers {
    pub fn compile(&self) -> Result<FoldingMatcher, regex::Error> {
        Ok(FoldingMatcher {
            start: Regex::new(&self.start)?,
            end: Regex::new(&self.end)?,
        })
    }
}

/// Compiled [`FoldingMarkers`].
#[derive(Debug, Clone)]
pub struct FoldingMatcher {
    start: Regex,
    end: Regex,
}

impl FoldingMatcher {
    pub fn is_start(&self, line: &str) -> bool {
        self.start.is_match(line)
    }

    pub fn is_end(&self, line: &str) -> bool {
        self.end.is_match(line)
    }
}

/// Mirrors the knobs exposed by [`TokenizerOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenizerConfig {
    pub script_language: String,
    pub style_language: String,
    pub token_postfix: String,
}

impl From<&TokenizerConfig> for TokenizerOptions {
    fn from(config: &TokenizerConfig) -> Self {
        TokenizerOptions {
            script_language: config.script_language.clone(),
            style_language: config.style_language.clone(),
            token_postfix: config.token_postfix.clone(),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<AstroConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<AstroConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.language.comments.block_comment, ["<!--", "-->"]);
        assert_eq!(config.language.brackets.len(), 4);
        assert_eq!(config.language.auto_close_before, ";:.,=}])>` \n\t");
        assert_eq!(config.tokenizer.script_language, "text/javascript");
        assert_eq!(config.tokenizer.token_postfix, ".astro");
    }

    #[test]
    fn auto_closing_pairs_keep_their_contexts() {
        let config = load_defaults().expect("defaults to deserialize");
        let comment = config
            .language
            .auto_closing_pairs
            .iter()
            .find(|pair| pair.open == "<!--")
            .expect("comment pair");
        assert_eq!(comment.close, "-->");
        assert_eq!(comment.not_in, vec!["comment", "string"]);

        let brace = &config.language.auto_closing_pairs[0];
        assert!(brace.not_in.is_empty());
    }

    #[test]
    fn folding_markers_match_region_comments() {
        let config = load_defaults().expect("defaults to deserialize");
        let folding = config.language.folding.compile().expect("folding regexes");

        assert!(folding.is_start("  <!-- #region header -->"));
        assert!(folding.is_end("<!--#endregion-->"));
        assert!(!folding.is_start("<!-- #regional -->"));
        assert!(!folding.is_start("<p><!-- #region --></p>"));
    }

    #[test]
    fn void_elements_ignore_case() {
        let config = load_defaults().expect("defaults to deserialize");
        assert!(config.language.is_void_element("br"));
        assert!(config.language.is_void_element("IMG"));
        assert!(!config.language.is_void_element("div"));
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("tokenizer.script_language", "typescript")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.tokenizer_options().script_language, "typescript");
        assert_eq!(config.tokenizer_options().style_language, "text/css");
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[tokenizer]\ntoken_postfix = \".component\"").expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.tokenizer.token_postfix, ".component");
        assert_eq!(config.tokenizer.style_language, "text/css");
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/astro.toml")
            .build()
            .expect("config to build");
        assert_eq!(config, load_defaults().expect("defaults to deserialize"));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        assert!(Loader::new().with_file("/nonexistent/astro.toml").build().is_err());
    }
}

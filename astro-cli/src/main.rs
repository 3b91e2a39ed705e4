//! Command-line interface for Astro highlighting
//! This binary tokenizes Astro components the way an editor host would, line by line,
//! and prints the resulting spans. It is mostly useful for checking the grammar.
//!
//! Usage:
//!   astro tokenize `<path>` [--format text|json] [--states] [--config `<file>`]
//!   astro config [--config `<file>`]            - Print the resolved configuration

use astro_config::{AstroConfig, Loader};
use astro_tokenizer::{tokenize_document, AstroTokenizer, DocumentTokens, TokenSpan};
use clap::{Arg, ArgAction, Command};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Read;
use tracing::debug;

fn cli() -> Command {
    Command::new("astro")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting how Astro components are highlighted")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("tokenize")
                .about("Tokenize a file and print the spans of every line")
                .arg(
                    Arg::new("path")
                        .help("Path to the Astro file, or - for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    Arg::new("states")
                        .long("states")
                        .help("Show the state stack each line ends in (text format)")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("config").about("Print the resolved configuration as JSON"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = load_config(matches.get_one::<String>("config"));

    match matches.subcommand() {
        Some(("tokenize", sub)) => {
            let path = sub
                .get_one::<String>("path")
                .expect("path is a required argument");
            let format = sub
                .get_one::<String>("format")
                .expect("format has a default value");
            handle_tokenize_command(&config, path, format, sub.get_flag("states"));
        }
        Some(("config", _)) => handle_config_command(&config),
        _ => unreachable!("a subcommand is required"),
    }
}

fn load_config(path: Option<&String>) -> AstroConfig {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    })
}

/// Handle the tokenize command
fn handle_tokenize_command(config: &AstroConfig, path: &str, format: &str, states: bool) {
    let source = read_source(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        std::process::exit(1);
    });

    let tokenizer = AstroTokenizer::with_builtin_languages().with_options(config.tokenizer_options());
    let document = tokenize_document(&tokenizer, &source);
    // A final newline terminates the last line rather than starting a new one
    let line_count = if source.ends_with('\n') {
        document.len().saturating_sub(1)
    } else {
        document.len()
    };
    debug!(path, lines = line_count, "tokenized document");

    let formatted = match format {
        "json" => {
            let report = json_report(&tokenizer, &document, line_count);
            serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
                eprintln!("Error formatting tokens: {}", e);
                std::process::exit(1);
            })
        }
        _ => text_report(&tokenizer, &document, line_count, states),
    };

    println!("{}", formatted);
}

/// Handle the config command
fn handle_config_command(config: &AstroConfig) {
    let formatted = serde_json::to_string_pretty(config).unwrap_or_else(|e| {
        eprintln!("Error formatting configuration: {}", e);
        std::process::exit(1);
    });
    println!("{}", formatted);
}

fn read_source(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
    }
}

/// One line per source line: `[scope text]` for classified spans, bare text otherwise.
fn text_report(
    tokenizer: &AstroTokenizer,
    document: &DocumentTokens,
    line_count: usize,
    states: bool,
) -> String {
    let mut out = String::new();
    for (index, tokens) in document.lines().iter().take(line_count).enumerate() {
        let text = document.text(index).unwrap_or_default();
        let _ = write!(out, "{:>4} | ", index + 1);
        for span in &tokens.spans {
            let scope = tokenizer.scope(&span.class);
            if scope.is_empty() {
                out.push_str(span.text(text));
            } else {
                let _ = write!(out, "[{} {}]", scope, span.text(text));
            }
        }
        if states {
            let _ = write!(out, "    -> {}", tokens.end_state);
        }
        out.push('\n');
    }
    out.truncate(out.trim_end_matches('\n').len());
    out
}

#[derive(Serialize)]
struct LineReport<'a> {
    line: usize,
    text: &'a str,
    spans: Vec<SpanReport<'a>>,
    state: String,
}

/// A span as `start`, `length` and `class`, plus the scope a host would theme.
#[derive(Serialize)]
struct SpanReport<'a> {
    #[serde(flatten)]
    span: &'a TokenSpan,
    scope: String,
}

fn json_report<'a>(
    tokenizer: &AstroTokenizer,
    document: &'a DocumentTokens,
    line_count: usize,
) -> Vec<LineReport<'a>> {
    document
        .lines()
        .iter()
        .take(line_count)
        .enumerate()
        .map(|(index, tokens)| LineReport {
            line: index + 1,
            text: document.text(index).unwrap_or_default(),
            spans: tokens
                .spans
                .iter()
                .map(|span| SpanReport {
                    span,
                    scope: tokenizer.scope(&span.class).into_owned(),
                })
                .collect(),
            state: tokens.end_state.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        cli().debug_assert();
    }

    #[test]
    fn text_report_applies_postfix() {
        let tokenizer = AstroTokenizer::default();
        let document = tokenize_document(&tokenizer, "<p>hi</p>");
        let report = text_report(&tokenizer, &document, 1, false);

        assert_eq!(
            report,
            "   1 | [delimiter.astro <][tag.astro p][delimiter.astro >]hi[delimiter.astro </][tag.astro p][delimiter.astro >]"
        );
    }

    #[test]
    fn json_report_carries_states() {
        let tokenizer = AstroTokenizer::default();
        let document = tokenize_document(&tokenizer, "<!--\n-->");
        let report = json_report(&tokenizer, &document, 2);

        assert_eq!(report[0].state, "root > comment");
        assert_eq!(report[1].state, "root");
        assert_eq!(report[0].spans[0].scope, "comment.astro");
    }

    #[test]
    fn json_spans_carry_class_and_scope() {
        let tokenizer = AstroTokenizer::default();
        let document = tokenize_document(&tokenizer, "<p>");
        let report = json_report(&tokenizer, &document, 1);
        let value = serde_json::to_value(&report).expect("report to serialize");

        assert_eq!(
            value[0]["spans"][1],
            serde_json::json!({"start": 1, "length": 1, "class": "tag", "scope": "tag.astro"})
        );
    }
}

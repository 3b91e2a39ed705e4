//! Property-based tests for the tokenizer
//!
//! Documents are built from fragments that exercise every state (tags, comments,
//! front-matter fences, expressions, script and style elements) mixed with arbitrary
//! text, so that unbalanced and truncated constructs come up often.

use astro_tokenizer::testing::{assert_covers, TaggingRegistry};
use astro_tokenizer::{split_lines, tokenize_document, AstroTokenizer, DocumentTokens, LineTokens};
use proptest::prelude::*;
use std::sync::Arc;

const FRAGMENTS: &[&str] = &[
    "---", "\n", "\n---\n", "<", ">", "/>", "</", "{", "}", "<div", "</div>", " class=",
    "\"x\"", "'y'", "=", "<!--", "-->", "<!DOCTYPE html>", "<script", "</script>", "<style",
    "</style>", " type=", "\"text/mycustom\"", "module", "a + b", "é", "漢字", "\r", "\t",
];

fn fragment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(FRAGMENTS).prop_map(str::to_string),
        1 => "\\PC{0,8}",
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment_strategy(), 0..40).prop_map(|parts| parts.concat())
}

fn tokenizers() -> [AstroTokenizer; 2] {
    [
        AstroTokenizer::with_builtin_languages(),
        AstroTokenizer::new(Arc::new(TaggingRegistry)),
    ]
}

fn tokenize_all(tokenizer: &AstroTokenizer, text: &str) -> Vec<LineTokens> {
    tokenize_document(tokenizer, text).lines().to_vec()
}

proptest! {
    #[test]
    fn spans_cover_every_line(text in document_strategy()) {
        for tokenizer in tokenizers() {
            let document = tokenize_document(&tokenizer, &text);
            for (index, line) in split_lines(&text).into_iter().enumerate() {
                let spans = document.spans(index).unwrap_or(&[]);
                assert_covers(line, spans);
            }
        }
    }

    #[test]
    fn tokenizing_is_deterministic(text in document_strategy()) {
        let tokenizer = AstroTokenizer::with_builtin_languages();
        prop_assert_eq!(tokenize_all(&tokenizer, &text), tokenize_all(&tokenizer, &text));
    }

    #[test]
    fn documents_do_not_affect_each_other(a in document_strategy(), b in document_strategy()) {
        let tokenizer = AstroTokenizer::with_builtin_languages();
        let a_first = (tokenize_all(&tokenizer, &a), tokenize_all(&tokenizer, &b));
        let b_second = tokenize_all(&tokenizer, &b);
        let a_second = tokenize_all(&tokenizer, &a);

        prop_assert_eq!(a_first.0, a_second);
        prop_assert_eq!(a_first.1, b_second);
    }

    #[test]
    fn incremental_update_matches_full_tokenization(
        text in document_strategy(),
        edit_line in 0usize..12,
        removed in 0usize..3,
        inserted in prop::collection::vec(document_strategy(), 0..3),
    ) {
        let tokenizer = AstroTokenizer::new(Arc::new(TaggingRegistry));
        let mut lines: Vec<String> = split_lines(&text).into_iter().map(str::to_string).collect();
        let inserted: Vec<String> = inserted
            .iter()
            .flat_map(|fragment| split_lines(fragment))
            .map(str::to_string)
            .collect();

        let mut document = DocumentTokens::new(&tokenizer, lines.clone());
        document.update_lines(&tokenizer, edit_line, removed, inserted.clone());

        let start = edit_line.min(lines.len());
        let end = (start + removed).min(lines.len());
        lines.splice(start..end, inserted);

        prop_assert_eq!(document, DocumentTokens::new(&tokenizer, lines));
    }
}

#[test]
fn open_braces_make_progress() {
    let tokenizer = AstroTokenizer::with_builtin_languages();
    let line = "{{{{{{{{";
    let tokens = tokenizer.tokenize_line(line, &tokenizer.initial_state());

    assert_covers(line, &tokens.spans);
    assert_eq!(tokens.end_state.depth(), 9);
}

#[test]
fn deep_nesting_does_not_recurse() {
    let tokenizer = AstroTokenizer::with_builtin_languages();
    let line = "{".repeat(20_000);
    let tokens = tokenizer.tokenize_line(&line, &tokenizer.initial_state());

    assert_covers(&line, &tokens.spans);
    assert_eq!(tokens.end_state.depth(), 20_001);

    let closing = "}".repeat(20_000);
    let tokens = tokenizer.tokenize_line(&closing, &tokens.end_state);
    assert!(tokens.end_state.is_root());
}

#[test]
fn tokenizer_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AstroTokenizer>();

    let documents = [
        "---\nconst a = 1;\n---\n<p>{a}</p>",
        "<style>\nh1 { color: red; }\n</style>",
        "<!--\nx\n-->\n<script type=\"module\">\nlet b = `\n`;\n</script>",
        "{{{ a }}}\n<div class={c}>",
    ];
    let tokenizer = Arc::new(AstroTokenizer::with_builtin_languages());
    let expected: Vec<Vec<LineTokens>> = documents
        .iter()
        .map(|document| tokenize_all(&tokenizer, document))
        .collect();

    let results: Vec<Vec<LineTokens>> = std::thread::scope(|scope| {
        let handles: Vec<_> = documents
            .iter()
            .map(|document| {
                let tokenizer = Arc::clone(&tokenizer);
                scope.spawn(move || tokenize_all(&tokenizer, document))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("tokenizing thread panicked"))
            .collect()
    });

    assert_eq!(results, expected);
}

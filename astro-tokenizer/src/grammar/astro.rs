//! The Astro component grammar
//!
//! Markup states (`root`, `doctype`, `comment`, `tagBody`), the front-matter fence,
//! `{...}` expressions and the `<script>` / `<style>` families. The script and style
//! families share one rule shape, generated per [`EmbedKind`].
//!
//! Regions that belong to another language are split in two states: a header that
//! stays on the stack and classifies the closing delimiter, and a body that carries
//! the embedded-language marker and only watches for the way out. Closing a body is
//! always a rematch, so the delimiter is classified by the state below it.

use super::{rule, Grammar, LanguageRef, RuleSpec, Target};
use crate::state::{EmbedKind, State, StateName};
use crate::token::TokenClass::{
    AttributeName, AttributeValue, Comment, CommentContent, Default, Delimiter, MetaTag,
    MetaTagContent, Tag,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// The compiled Astro grammar, shared by every tokenizer.
pub static ASTRO_GRAMMAR: Lazy<Arc<Grammar>> = Lazy::new(|| {
    Arc::new(Grammar::compile(astro_rules()).expect("built-in Astro grammar must compile"))
});

/// Optional namespace plus element name: `div`, `my-element`, `svg:rect`.
const TAG_NAME: &str = r"(?:[\w\-]+:)?[\w\-]+";
const ATTRIBUTE_NAME: &str = r"[\w\-:@.]+";
const DOUBLE_QUOTED: &str = r#""([^"]*)""#;
const SINGLE_QUOTED: &str = r"'([^']*)'";
const WHITESPACE: &str = r"[ \t\r\n]+";
const FENCE: &str = r"---[ \t]*$";

/// The full rule table, in the form [`Grammar::compile`] takes.
pub fn astro_rules() -> Vec<(StateName, Vec<RuleSpec>)> {
    let mut table = vec![
        (StateName::Root, root()),
        (StateName::Doctype, doctype()),
        (StateName::Comment, comment()),
        (StateName::FrontmatterHeader, frontmatter_header()),
        (StateName::FrontmatterBody, frontmatter_body()),
        (StateName::ExpressionHeader, expression_header()),
        (StateName::ExpressionBody, expression_body()),
        (StateName::TagBody, tag_body()),
    ];
    for kind in [EmbedKind::Script, EmbedKind::Style] {
        table.extend(raw_text_family(kind));
    }
    table
}

fn root() -> Vec<RuleSpec> {
    vec![
        rule("<!DOCTYPE").class(MetaTag).push(State::Doctype),
        rule("<!--").class(Comment).push(State::Comment),
        rule("---")
            .class(Comment)
            .at_document_start()
            .push(State::FrontmatterHeader),
        rule(r"\{").push(State::ExpressionHeader),
        rule(format!(r"(<)({TAG_NAME})(\s*)(/>)")).groups([Delimiter, Tag, Default, Delimiter]),
        rule(r"(<)(script)\b")
            .groups([Delimiter, Tag])
            .push(State::RawTag(EmbedKind::Script)),
        rule(r"(<)(style)\b")
            .groups([Delimiter, Tag])
            .push(State::RawTag(EmbedKind::Style)),
        rule(format!(r"(<)({TAG_NAME})"))
            .groups([Delimiter, Tag])
            .push(State::TagBody),
        rule(format!(r"(</)({TAG_NAME})"))
            .groups([Delimiter, Tag])
            .push(State::TagBody),
        rule("<").class(Delimiter),
        rule(r"[^<{]+"),
    ]
}

fn doctype() -> Vec<RuleSpec> {
    vec![
        rule(r"[^>]+").class(MetaTagContent),
        rule(">").class(MetaTag).pop(),
    ]
}

fn comment() -> Vec<RuleSpec> {
    vec![
        rule("-->").class(Comment).pop(),
        rule(r"[^-]+").class(CommentContent),
        rule(".").class(CommentContent),
    ]
}

fn frontmatter_header() -> Vec<RuleSpec> {
    vec![
        rule(FENCE).at_line_start().class(Comment).pop(),
        rule(".")
            .rematch()
            .push(State::FrontmatterBody)
            .enter(LanguageRef::Default(EmbedKind::Script)),
    ]
}

fn frontmatter_body() -> Vec<RuleSpec> {
    vec![rule(FENCE).at_line_start().rematch().pop().exit()]
}

fn expression_header() -> Vec<RuleSpec> {
    vec![
        rule(r"[^<{}]")
            .rematch()
            .push(State::ExpressionBody)
            .enter(LanguageRef::Default(EmbedKind::Script)),
        rule(r"\{").push(State::ExpressionHeader),
        // `<` ends the expression without checking the braces
        rule("<").rematch().pop(),
        rule(r"\}").pop(),
    ]
}

fn expression_body() -> Vec<RuleSpec> {
    vec![
        rule(r"\{").push(State::ExpressionHeader),
        rule("<").rematch().pop().exit(),
        rule(r"\}").rematch().pop().exit(),
    ]
}

fn tag_body() -> Vec<RuleSpec> {
    vec![
        rule(r"/?>").class(Delimiter).pop(),
        rule(DOUBLE_QUOTED).class(AttributeValue),
        rule(SINGLE_QUOTED).class(AttributeValue),
        rule(ATTRIBUTE_NAME).class(AttributeName),
        rule("=").class(Delimiter),
        rule(r"\{").push(State::ExpressionHeader),
        rule(WHITESPACE),
        // Unclosed tag, or the `<` that ended an attribute expression
        rule("<").rematch().pop(),
    ]
}

/// `<script ...>` and `<style ...>`: the tag's attributes, an optional `type`
/// naming the content type, the embedded body and the closing tag.
fn raw_text_family(kind: EmbedKind) -> Vec<(StateName, Vec<RuleSpec>)> {
    let name = kind.tag_name();
    let default_language = LanguageRef::Default(kind);
    let body = || State::RawBody(kind);
    let closing_tag = format!(r"</{name}\s*>");

    let tag = vec![
        rule(r"type\b")
            .class(AttributeName)
            .push(State::RawAfterType(kind)),
        rule(DOUBLE_QUOTED).class(AttributeValue),
        rule(SINGLE_QUOTED).class(AttributeValue),
        rule(ATTRIBUTE_NAME).class(AttributeName),
        rule("=").class(Delimiter),
        rule(r"\{").push(State::ExpressionHeader),
        rule("/>").class(Delimiter).pop(),
        rule(">")
            .class(Delimiter)
            .push(body())
            .enter(default_language),
        rule(WHITESPACE),
        rule(format!(r"(</)({name}\s*)(>)"))
            .groups([Delimiter, Tag, Delimiter])
            .pop(),
        rule("<").rematch().pop(),
    ];

    let after_type = vec![
        rule("=")
            .class(Delimiter)
            .push(State::RawAfterTypeEquals(kind)),
        // `<script type>`
        rule(">")
            .class(Delimiter)
            .push(body())
            .enter(default_language),
        rule(WHITESPACE),
        rule(closing_tag.clone()).rematch().pop(),
        rule("/>").rematch().pop(),
        rule("<").rematch().pop(),
        // `type` without a value, followed by more attributes
        rule(ATTRIBUTE_NAME).rematch().pop(),
    ];

    let after_type_equals = vec![
        rule(DOUBLE_QUOTED)
            .class(AttributeValue)
            .switch(Target::CustomType(kind, 1)),
        rule(SINGLE_QUOTED)
            .class(AttributeValue)
            .switch(Target::CustomType(kind, 1)),
        // `<script type=>`
        rule(">")
            .class(Delimiter)
            .push(body())
            .enter(default_language),
        rule(WHITESPACE),
        rule(closing_tag.clone()).rematch().pop(),
        rule("/>").rematch().pop(),
        rule("<").rematch().pop(),
        rule(r#"[^\s"'<>=/]+"#)
            .class(AttributeValue)
            .switch(Target::CustomType(kind, 0)),
    ];

    let custom_type = vec![
        rule(">")
            .class(Delimiter)
            .push(body())
            .enter(LanguageRef::StateArgument),
        rule(DOUBLE_QUOTED).class(AttributeValue),
        rule(SINGLE_QUOTED).class(AttributeValue),
        rule(ATTRIBUTE_NAME).class(AttributeName),
        rule("=").class(Delimiter),
        rule(r"\{").push(State::ExpressionHeader),
        rule(WHITESPACE),
        rule(closing_tag).rematch().pop(),
        rule("/>").rematch().pop(),
        rule("<").rematch().pop(),
    ];

    let embedded = vec![rule(format!("</{name}")).rematch().pop().exit()];

    vec![
        (StateName::RawTag(kind), tag),
        (StateName::RawAfterType(kind), after_type),
        (StateName::RawAfterTypeEquals(kind), after_type_equals),
        (StateName::RawCustomType(kind), custom_type),
        (StateName::RawBody(kind), embedded),
    ]
}

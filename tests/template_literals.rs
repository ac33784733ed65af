use freshen::errors::FreshenError;
use freshen::templates::expr::eval_literal;
use freshen::templates::parser::{parse_extends, parse_includes, strip_dependency_tags};
use serde_json::json;

#[test]
fn scalars_are_accepted() {
    assert_eq!(eval_literal("\"hello\"").unwrap(), json!("hello"));
    assert_eq!(eval_literal("'single'").unwrap(), json!("single"));
    assert_eq!(eval_literal("42").unwrap(), json!(42));
    assert_eq!(eval_literal("-7").unwrap(), json!(-7));
    assert_eq!(eval_literal("2.5").unwrap(), json!(2.5));
    assert_eq!(eval_literal("true").unwrap(), json!(true));
    assert_eq!(eval_literal("false").unwrap(), json!(false));
    assert_eq!(eval_literal("none").unwrap(), json!(null));
    assert_eq!(eval_literal("null").unwrap(), json!(null));
}

#[test]
fn string_escapes_are_decoded() {
    assert_eq!(eval_literal(r#""a\"b\nc""#).unwrap(), json!("a\"b\nc"));
    assert_eq!(eval_literal(r#"'it\'s'"#).unwrap(), json!("it's"));
    assert_eq!(eval_literal(r#""é""#).unwrap(), json!("é"));
}

#[test]
fn nested_collections_with_trailing_commas() {
    let value = eval_literal(
        r#"{ links: [ { "label": 'Home', weight: 1, }, ], draft: false, }"#,
    )
    .unwrap();
    assert_eq!(
        value,
        json!({ "links": [ { "label": "Home", "weight": 1 } ], "draft": false })
    );
    assert_eq!(eval_literal("[]").unwrap(), json!([]));
    assert_eq!(eval_literal("{}").unwrap(), json!({}));
}

#[test]
fn non_literals_fail_closed() {
    for expr in [
        "page.title",
        "items | length",
        "range(0, 3)",
        "1 + 2",
        "\"a\" ~ \"b\"",
        "[1, 2",
        "{ a 1 }",
        "\"unterminated",
        "",
    ] {
        match eval_literal(expr) {
            Err(FreshenError::UnsupportedExpression(raw)) => assert_eq!(raw, expr),
            other => panic!("expected UnsupportedExpression for {expr:?}, got {other:?}"),
        }
    }
}

#[test]
fn last_extends_tag_wins() {
    let text = "{% extends 'a.njk' %}\n{%- extends \"b.njk\" -%}";
    assert_eq!(parse_extends(text).as_deref(), Some("b.njk"));
    assert_eq!(parse_extends("no tags here"), None);
}

#[test]
fn includes_keep_document_order_and_duplicates() {
    let text = "{% include 'nav.njk' %}{% include \"foot.njk\" ignore missing %}{% include 'nav.njk' %}";
    assert_eq!(parse_includes(text), vec!["nav.njk", "foot.njk", "nav.njk"]);
}

#[test]
fn stripping_removes_only_dependency_tags() {
    let text = "{% extends 'base.njk' %}{% block content %}{% include 'x.njk' %}body{% endblock %}";
    assert_eq!(
        strip_dependency_tags(text),
        "{% block content %}body{% endblock %}"
    );
}

#[test]
fn deep_nesting_is_rejected_without_recursing_further() {
    let deep = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
    assert!(matches!(
        eval_literal(&deep),
        Err(FreshenError::UnsupportedExpression(_))
    ));

    let objects = format!("{}1{}", "{a:".repeat(10_000), "}".repeat(10_000));
    assert!(matches!(
        eval_literal(&objects),
        Err(FreshenError::UnsupportedExpression(_))
    ));
}

#[test]
fn nesting_up_to_the_limit_is_accepted() {
    let at_limit = format!("{}{}", "[".repeat(128), "]".repeat(128));
    assert!(eval_literal(&at_limit).is_ok());

    let past_limit = format!("{}{}", "[".repeat(129), "]".repeat(129));
    assert!(eval_literal(&past_limit).is_err());
}

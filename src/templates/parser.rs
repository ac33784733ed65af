// src/templates/parser.rs

//! Regex extraction of template directives.
//!
//! Only the tag syntax matters here, e.g.
//!
//! ```text
//! {% extends "layouts/base.njk" %}
//! {% include 'partials/nav.njk' ignore missing %}
//! {% block content %}
//! {%- set nav = [{ title: "Home", url: "/" }] -%}
//! ```

use std::sync::LazyLock;

use regex::Regex;

static EXTENDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*extends\s+["']([^"']+)["']\s*-?%\}"#).expect("valid extends regex")
});

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*include\s+["']([^"']+)["'][^%]*%\}"#).expect("valid include regex")
});

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*block\s+([A-Za-z_][A-Za-z0-9_]*)\s*-?%\}"#).expect("valid block regex")
});

static SET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{%-?\s*set\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*-?%\}"#)
        .expect("valid set regex")
});

/// The active parent: the last `extends` tag in the text, if any.
///
/// Several `extends` tags in one file is a template error that is not
/// reported; the last one simply wins.
pub fn parse_extends(content: &str) -> Option<String> {
    EXTENDS_RE
        .captures_iter(content)
        .last()
        .map(|caps| caps[1].to_string())
}

/// Every `include` reference, in document order (duplicates kept).
pub fn parse_includes(content: &str) -> Vec<String> {
    INCLUDE_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Names of every `block` opened in the text, in document order.
pub fn parse_blocks(content: &str) -> Vec<String> {
    BLOCK_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// `(name, raw right-hand side)` for every `set` tag with an assignment.
pub fn parse_sets(content: &str) -> Vec<(String, String)> {
    SET_RE
        .captures_iter(content)
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

/// Remove `extends` and `include` tags, leaving everything else untouched.
pub fn strip_dependency_tags(content: &str) -> String {
    let without_extends = EXTENDS_RE.replace_all(content, "");
    INCLUDE_RE.replace_all(&without_extends, "").into_owned()
}

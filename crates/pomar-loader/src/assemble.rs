//! Splitting reassembled HTML into what gets spliced into the page.

use regex::Regex;
use std::sync::LazyLock;

static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").expect("style pattern"));
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script pattern")
});
static SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("src pattern")
});
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|$)").expect("body pattern"));
static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>.*?</head\s*>").expect("head pattern"));
static WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<!doctype[^>]*>|</?html\b[^>]*>").expect("wrapper pattern")
});
static STYLE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<style\b").expect("style open pattern"));
static SCRIPT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script\b").expect("script open pattern"));

/// A script element found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    /// External source, if the script has one.
    pub src: Option<String>,
    /// Inline text; empty for external scripts.
    pub text: String,
}

/// The pieces of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedDocument {
    pub styles: Vec<String>,
    /// Inner HTML of the body.
    pub body: String,
    pub scripts: Vec<ScriptElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    #[error("unterminated <{0}> element")]
    Unterminated(&'static str),
}

/// Parse concatenated fragment text.
///
/// Documents without a `<body>` element are treated as body content, minus
/// any `<head>` section and the doctype/`<html>` wrapper.
pub fn parse(html: &str) -> Result<ParsedDocument, AssembleError> {
    if STYLE_OPEN.find_iter(html).count() != STYLE.find_iter(html).count() {
        return Err(AssembleError::Unterminated("style"));
    }
    if SCRIPT_OPEN.find_iter(html).count() != SCRIPT.find_iter(html).count() {
        return Err(AssembleError::Unterminated("script"));
    }

    let styles = STYLE
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect();

    let scripts = SCRIPT
        .captures_iter(html)
        .map(|c| {
            let src = SRC.captures(&c[1]).and_then(|s| {
                s.get(1)
                    .or_else(|| s.get(2))
                    .or_else(|| s.get(3))
                    .map(|m| m.as_str().to_string())
            });
            let text = if src.is_some() {
                String::new()
            } else {
                c[2].to_string()
            };
            ScriptElement { src, text }
        })
        .collect();

    let body = match BODY.captures(html) {
        Some(c) => c[1].to_string(),
        None => {
            let without_head = HEAD.replace_all(html, "");
            WRAPPER.replace_all(&without_head, "").trim().to_string()
        }
    };

    Ok(ParsedDocument {
        styles,
        body,
        scripts,
    })
}

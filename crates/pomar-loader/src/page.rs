//! The host page the loader writes into.

use crate::assemble::{ParsedDocument, ScriptElement};
use std::fmt::Write as _;

/// Inline panel shown when the content cannot be assembled.
pub const ERROR_PANEL: &str = r#"<div style="text-align: center; padding: 20px; color: #721c24;">Error loading the content. Please reload the page.</div>"#;

/// An element the loader added to the page head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadNode {
    Style {
        text: String,
        /// Inserted by the loader rather than shipped with the page.
        dynamic: bool,
    },
    Script {
        src: Option<String>,
        text: String,
        is_async: bool,
        dynamic: bool,
    },
}

/// In-memory model of the loader page: a head, a progress bar, a loading
/// message and the app container that receives the assembled body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    head: Vec<HeadNode>,
    container: String,
    loading_message: String,
    progress: f64,
    resize_events: u32,
    reflows: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            head: Vec::new(),
            container: String::new(),
            loading_message: "Loading...".to_string(),
            progress: 0.0,
            resize_events: 0,
            reflows: 0,
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> &[HeadNode] {
        &self.head
    }

    /// Inner HTML of the app container.
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    /// Progress bar width, in percent.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn resize_events(&self) -> u32 {
        self.resize_events
    }

    pub fn reflows(&self) -> u32 {
        self.reflows
    }

    pub fn set_progress(&mut self, loaded: usize, total: usize) {
        self.progress = if total == 0 {
            100.0
        } else {
            loaded as f64 / total as f64 * 100.0
        };
    }

    pub fn set_loading_message(&mut self, message: impl Into<String>) {
        self.loading_message = message.into();
    }

    /// Replace the container with the parsed document: styles and scripts go
    /// to the head, body content into the container.
    pub fn splice(&mut self, parsed: ParsedDocument) {
        self.container.clear();
        for text in parsed.styles {
            self.head.push(HeadNode::Style {
                text,
                dynamic: true,
            });
        }
        self.container.push_str(&parsed.body);
        for ScriptElement { src, text } in parsed.scripts {
            let is_async = src.is_some();
            self.head.push(HeadNode::Script {
                src,
                text,
                is_async,
                dynamic: true,
            });
        }
    }

    pub fn show_error(&mut self) {
        self.container = ERROR_PANEL.to_string();
    }

    pub fn dispatch_resize(&mut self) {
        self.resize_events += 1;
    }

    /// Hide and re-show the container, forcing layout.
    pub fn reflow(&mut self) {
        self.reflows += 1;
    }

    /// Serialize the page.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n");
        for node in &self.head {
            match node {
                HeadNode::Style { text, dynamic } => {
                    let _ = writeln!(html, "<style{}>{text}</style>", dynamic_attr(*dynamic));
                }
                HeadNode::Script {
                    src: Some(src),
                    is_async,
                    dynamic,
                    ..
                } => {
                    let _ = writeln!(
                        html,
                        "<script src=\"{}\"{}{}></script>",
                        src.replace('"', "&quot;"),
                        if *is_async { " async" } else { "" },
                        dynamic_attr(*dynamic)
                    );
                }
                HeadNode::Script {
                    src: None,
                    text,
                    dynamic,
                    ..
                } => {
                    let _ = writeln!(html, "<script{}>{text}</script>", dynamic_attr(*dynamic));
                }
            }
        }
        let _ = write!(
            html,
            "</head>\n<body>\n<div id=\"app-container\">{}</div>\n</body>\n</html>\n",
            self.container
        );
        html
    }
}

fn dynamic_attr(dynamic: bool) -> &'static str {
    if dynamic { " data-dynamic=\"true\"" } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_moves_styles_and_scripts_to_head() {
        let mut doc = Document::new();
        doc.splice(ParsedDocument {
            styles: vec!["p{}".to_string()],
            body: "<p>hi</p>".to_string(),
            scripts: vec![
                ScriptElement {
                    src: Some("a.js".to_string()),
                    text: String::new(),
                },
                ScriptElement {
                    src: None,
                    text: "run()".to_string(),
                },
            ],
        });

        assert_eq!(doc.container(), "<p>hi</p>");
        assert_eq!(
            doc.head(),
            &[
                HeadNode::Style {
                    text: "p{}".to_string(),
                    dynamic: true
                },
                HeadNode::Script {
                    src: Some("a.js".to_string()),
                    text: String::new(),
                    is_async: true,
                    dynamic: true
                },
                HeadNode::Script {
                    src: None,
                    text: "run()".to_string(),
                    is_async: false,
                    dynamic: true
                },
            ]
        );

        let html = doc.to_html();
        assert!(html.contains(r#"<style data-dynamic="true">p{}</style>"#));
        assert!(html.contains(r#"<script src="a.js" async data-dynamic="true"></script>"#));
        assert!(html.contains(r#"<div id="app-container"><p>hi</p></div>"#));
    }

    #[test]
    fn progress_is_a_percentage() {
        let mut doc = Document::new();
        doc.set_progress(1, 4);
        assert_eq!(doc.progress(), 25.0);
        doc.set_progress(0, 0);
        assert_eq!(doc.progress(), 100.0);
    }

    #[test]
    fn error_panel_replaces_container() {
        let mut doc = Document::new();
        doc.splice(ParsedDocument {
            body: "<p>partial</p>".to_string(),
            ..ParsedDocument::default()
        });
        doc.show_error();
        assert_eq!(doc.container(), ERROR_PANEL);
    }
}

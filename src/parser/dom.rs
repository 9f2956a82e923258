//! Thin navigation layer over `scraper`.
//!
//! Every lookup returns an `Option`; a missing element is an ordinary outcome
//! and callers degrade the corresponding field instead of failing the record.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const LINE_BREAK_TAGS: &[&str] = &["br", "p", "div", "li"];

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_ws(s: &str) -> String {
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

/// Compile a selector known at build time. Only used for static selector tables.
pub fn css(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("bad selector {selector:?}: {e}"))
}

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Document {
            html: Html::parse_document(text),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// First descendant matching `sel`.
    pub fn find(&self, sel: &Selector) -> Option<Node<'a>> {
        self.0.select(sel).next().map(Node)
    }

    /// All descendants matching `sel`, in document order.
    pub fn find_all(&self, sel: &Selector) -> Vec<Node<'a>> {
        self.0.select(sel).map(Node).collect()
    }

    /// Direct element children with the given tag name.
    pub fn children_named(&self, tag: &str) -> Vec<Node<'a>> {
        self.0
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == tag)
            .map(Node)
            .collect()
    }

    /// Nearest following sibling element matching `sel`. Scanning stops with
    /// `None` at the first sibling matching `stop`.
    pub fn next_sibling_matching(&self, sel: &Selector, stop: &Selector) -> Option<Node<'a>> {
        for sibling in self.0.next_siblings().filter_map(ElementRef::wrap) {
            if sel.matches(&sibling) {
                return Some(Node(sibling));
            }
            if stop.matches(&sibling) {
                return None;
            }
        }
        None
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Attribute value, trimmed; `None` when absent or blank.
    pub fn non_empty_attr(&self, name: &str) -> Option<&'a str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Class tokens in the order they appear in the attribute.
    pub fn classes(&self) -> Vec<&'a str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// All descendant text joined by spaces, whitespace-normalized.
    pub fn text(&self) -> String {
        let joined = self.0.text().collect::<Vec<_>>().join(" ");
        normalize_ws(&joined)
    }

    /// Like [`Node::text`] but `None` for elements with no visible text.
    pub fn text_non_empty(&self) -> Option<String> {
        Some(self.text()).filter(|t| !t.is_empty())
    }

    /// Non-empty text lines. Inline markup stays on its line; a newline in
    /// the text, a `<br>` or the start of a block element begins a new one.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for node in self.0.descendants() {
            match node.value() {
                scraper::Node::Text(t) => {
                    let mut parts = t.split('\n');
                    if let Some(first) = parts.next() {
                        current.push_str(first);
                    }
                    for part in parts {
                        lines.push(std::mem::take(&mut current));
                        current.push_str(part);
                    }
                }
                scraper::Node::Element(e) if LINE_BREAK_TAGS.contains(&e.name()) => {
                    lines.push(std::mem::take(&mut current));
                }
                _ => {}
            }
        }
        lines.push(current);
        lines
            .iter()
            .map(|l| normalize_ws(l))
            .filter(|l| !l.is_empty())
            .collect()
    }
}

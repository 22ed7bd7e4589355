// src/document/html.rs
use super::{DocumentReader, NodeReader};
use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page backed by the `scraper` crate.
///
/// Parsing is lenient: malformed markup still yields a document. The
/// parsed tree is not `Send`, so it is built and dropped within a
/// synchronous scope on the worker that fetched the page.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }
}

impl DocumentReader for HtmlDocument {
    type Node<'a> = HtmlNode<'a>;

    fn select<'a>(&'a self, selector: &str) -> Vec<HtmlNode<'a>> {
        match compile(selector) {
            Some(selector) => self.html.select(&selector).map(HtmlNode).collect(),
            None => Vec::new(),
        }
    }
}

/// An element inside an [`HtmlDocument`].
#[derive(Clone, Copy)]
pub struct HtmlNode<'a>(ElementRef<'a>);

impl NodeReader for HtmlNode<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }

    fn text(&self) -> String {
        self.0.text().collect()
    }

    fn select(&self, selector: &str) -> Vec<Self> {
        match compile(selector) {
            Some(selector) => self.0.select(&selector).map(HtmlNode).collect(),
            None => Vec::new(),
        }
    }

    fn children(&self) -> Vec<Self> {
        self.0
            .children()
            .filter_map(ElementRef::wrap)
            .map(HtmlNode)
            .collect()
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::warn!("Failed to compile selector '{}': {}", selector, e);
            None
        }
    }
}

// src/document/mod.rs
//! Read-only access to a fetched page's markup.
//!
//! Extraction and discovery only need selector lookups and attribute/text
//! reads. Expressing that as two small traits keeps them independent of
//! the HTML engine: [`HtmlDocument`] is the real interpreter, tests may
//! use an in-memory tree.

mod html;

pub use html::{HtmlDocument, HtmlNode};

/// One element of a document.
pub trait NodeReader: Sized {
    /// The value of attribute `name`, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Concatenated text of the element and its descendants.
    fn text(&self) -> String;

    /// Descendants matching a CSS `selector`, in document order.
    fn select(&self, selector: &str) -> Vec<Self>;

    /// Direct child elements, in document order.
    fn children(&self) -> Vec<Self>;
}

/// A whole page.
pub trait DocumentReader {
    type Node<'a>: NodeReader
    where
        Self: 'a;

    /// Elements matching a CSS `selector`, in document order.
    fn select<'a>(&'a self, selector: &str) -> Vec<Self::Node<'a>>;
}

// src/crawl/extraction.rs
//! Per-page side effects: raw snapshot and product extraction.

use crate::api::FetchedPage;
use crate::constants::{
    AGE_PARAM_CLASS, GAME_TIME_PARAM_CLASS, PLAYERS_PARAM_CLASS, PRODUCT_BLOCK_SELECTOR,
    PRODUCT_DESC_SELECTOR, PRODUCT_LINK_SELECTOR, PRODUCT_PARAMS_SELECTOR,
};
use crate::document::{DocumentReader, HtmlDocument, NodeReader};
use crate::model::Item;
use crate::pipeline::PageHandler;
use crate::session::Session;
use std::sync::Arc;
use url::Url;

/// Maps every product block of `document` to an [`Item`], in document order.
pub fn extract_items<D: DocumentReader>(document: &D, page_url: &Url) -> Vec<Item> {
    document
        .select(PRODUCT_BLOCK_SELECTOR)
        .iter()
        .map(|block| extract_item(block, page_url))
        .collect()
}

/// Builds one item from a product block.
///
/// Missing attributes leave their field empty; a block never fails.
pub fn extract_item<N: NodeReader>(block: &N, page_url: &Url) -> Item {
    let mut item = Item {
        product_id: block.attr("data-product_id").unwrap_or_default(),
        price: block.attr("data-price").unwrap_or_default(),
        src_page_ref: page_url.to_string(),
        ..Default::default()
    };

    if let Some(link) = block.select(PRODUCT_LINK_SELECTOR).first() {
        if let Some(title) = link.attr("title") {
            item.title = strip_newlines(&title);
        }
        if let Some(href) = link.attr("href") {
            item.href = strip_newlines(&href);
        }
    }

    let desc: String = block
        .select(PRODUCT_DESC_SELECTOR)
        .iter()
        .map(NodeReader::text)
        .collect();
    item.desc = strip_newlines(&desc);

    for param in block
        .select(PRODUCT_PARAMS_SELECTOR)
        .iter()
        .flat_map(NodeReader::children)
    {
        let (Some(class), Some(title)) = (param.attr("class"), param.attr("title")) else {
            continue;
        };
        let value = strip_newlines(&title);
        match class.as_str() {
            PLAYERS_PARAM_CLASS => item.number_of_players = value,
            GAME_TIME_PARAM_CLASS => item.game_time = value,
            AGE_PARAM_CLASS => item.age = value,
            _ => {}
        }
    }

    item
}

fn strip_newlines(value: &str) -> String {
    value.replace('\n', "")
}

/// Wires fetched pages into a [`Session`]: snapshots the body, then
/// appends every extracted item to the session buffer.
pub struct ExtractionCallback {
    session: Arc<Session>,
}

impl ExtractionCallback {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl PageHandler for ExtractionCallback {
    async fn on_response(&self, page: &FetchedPage) {
        let path = self.session.snapshot_path(&page.url);
        match tokio::fs::write(&path, &page.body).await {
            Ok(()) => log::debug!("Saved {} to {}", page.url, path.display()),
            Err(e) => log::warn!("Can't write file {}: {}", path.display(), e),
        }
    }

    fn on_document(&self, page: &FetchedPage) -> usize {
        let items = {
            let document = HtmlDocument::parse(&page.text());
            extract_items(&document, &page.url)
        };
        let count = items.len();
        for item in items {
            self.session.append_item(item);
        }
        log::debug!("Extracted {} items from {}", count, page.url);
        count
    }
}

// src/model/item.rs
use serde::Serialize;

/// Column order of `result.csv` and `header.csv`; matches the serde names of [`Item`].
pub const CSV_COLUMNS: [&str; 9] = [
    "ProductID",
    "Price",
    "Title",
    "HREF",
    "Desc",
    "GameTime",
    "NumberOfPlayers",
    "Age",
    "SrcPageRef",
];

/// One catalog product as it appeared on a fetched page.
///
/// Every field is kept as text. `price` in particular preserves the
/// site's formatting and is never parsed. A field whose source attribute
/// was missing stays empty. Identical products seen on two pages produce
/// two items; nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Item {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "HREF")]
    pub href: String,
    #[serde(rename = "Desc")]
    pub desc: String,
    #[serde(rename = "GameTime")]
    pub game_time: String,
    #[serde(rename = "NumberOfPlayers")]
    pub number_of_players: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "SrcPageRef")]
    pub src_page_ref: String,
}

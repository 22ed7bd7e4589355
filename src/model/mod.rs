// src/model/mod.rs
//! Records extracted from catalog pages.

mod item;

pub use item::{Item, CSV_COLUMNS};

//! Prescription AI Common Library
//!
//! 医薬品カタログの読み込みと、OCRテキストとのあいまい照合。
//! サーバーとCLIで共有される。

pub mod types;
pub mod error;
pub mod catalog;
pub mod similarity;
pub mod matcher;

pub use types::{CatalogEntry, MatchOptions, MatchResult};
pub use error::{Error, Result};
pub use catalog::MedicineCatalog;
pub use similarity::{extract, ratio, token_sort_ratio};
pub use matcher::{find_best_medicine_match, Matcher};

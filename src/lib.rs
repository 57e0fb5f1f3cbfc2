//! 処方箋OCR・医薬品照合
//!
//! 手書き処方箋の画像からテキストを抽出し、医薬品カタログとあいまい照合する。
//! 照合ロジック本体は `prescription_ai_common` にある。

pub mod ai_provider;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod medicine_info;
pub mod ocr;
pub mod scanner;
pub mod server;

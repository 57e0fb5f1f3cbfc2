//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog file not found: {0}")]
    CatalogNotFound(String),

    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

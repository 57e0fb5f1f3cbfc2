use thiserror::Error;

/// エラーの分類
///
/// - Validation: 入力側の問題（空のアップロード、読めない画像など）。メッセージをそのまま返す
/// - Processing: 内部処理の失敗。ログに記録し、呼び出し側には汎用メッセージのみ返す
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Processing,
}

#[derive(Error, Debug)]
pub enum PrescriptionAiError {
    #[error("アップロードされたファイルが空です")]
    EmptyUpload,

    #[error("画像ファイルを開けません: {0}")]
    ImageDecode(String),

    #[error("入力が不正です: {0}")]
    InvalidInput(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("画像処理エラー: {0}")]
    ImageProcessing(String),

    #[error("OCR実行エラー: {0}")]
    OcrExecution(String),

    #[error("AI CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("内部エラー: {0}")]
    Internal(String),

    #[error(transparent)]
    Catalog(#[from] prescription_ai_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl PrescriptionAiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PrescriptionAiError::EmptyUpload
            | PrescriptionAiError::ImageDecode(_)
            | PrescriptionAiError::InvalidInput(_) => ErrorKind::Validation,
            _ => ErrorKind::Processing,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

pub type Result<T> = std::result::Result<T, PrescriptionAiError>;

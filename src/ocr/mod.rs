//! 処方箋画像からのテキスト抽出
//!
//! 認識モデル自体は外部コマンド（tesseract等）またはAI CLIに任せ、
//! ここでは前処理と呼び出しだけを行う。

pub mod cache;
pub mod command;
pub mod preprocess;

pub use command::{AiVisionOcr, CommandOcr};
pub use preprocess::{preprocess_image, DEFAULT_SCALE};

use crate::config::Config;
use crate::error::{PrescriptionAiError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 認識エンジンの種類
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    /// 外部OCRコマンド
    #[default]
    Command,
    /// AI CLIの画像読み取り
    Ai,
}

/// 画像バイト列 → テキスト
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image_bytes: &[u8]) -> Result<String>;
}

/// 設定からエンジンを構築
pub fn build_extractor(config: &Config) -> Arc<dyn TextExtractor> {
    match config.ocr_engine {
        OcrEngine::Command => Arc::new(CommandOcr::new(
            config.ocr_command.clone(),
            config.ocr_args.clone(),
            config.scale_factor,
        )),
        OcrEngine::Ai => Arc::new(AiVisionOcr::new(config.ai_provider, config.scale_factor)),
    }
}

/// 空入力を弾いてから抽出し、前後の空白を除去する
pub fn extract_text(extractor: &dyn TextExtractor, image_bytes: &[u8]) -> Result<String> {
    if image_bytes.is_empty() {
        return Err(PrescriptionAiError::EmptyUpload);
    }
    let text = extractor.extract_text(image_bytes)?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract_text(&self, _image_bytes: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_extract_text_rejects_empty() {
        let err = extract_text(&FixedText("x"), &[]).unwrap_err();
        assert!(matches!(err, PrescriptionAiError::EmptyUpload));
        assert!(err.is_validation());
    }

    #[test]
    fn test_extract_text_trims() {
        let text = extract_text(&FixedText("  Aspirin\nDolo 650 \n\n"), b"bytes").unwrap();
        assert_eq!(text, "Aspirin\nDolo 650");
    }
}

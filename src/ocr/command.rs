//! 外部コマンドによる文字認識
//!
//! 前処理済み画像を一時PNGに書き出し、認識コマンドに渡す。
//! - CommandOcr: tesseract など、標準出力にテキストを出すコマンド
//! - AiVisionOcr: AI CLIに画像ファイルを読ませて書き起こす

use super::preprocess::{encode_png, preprocess_image};
use super::TextExtractor;
use crate::ai_provider::AiProvider;
use crate::error::{PrescriptionAiError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 引数中の入力パスのプレースホルダ
pub const INPUT_PLACEHOLDER: &str = "{input}";

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("prescription-ai")
}

/// 前処理してから一時PNGに書き出す
fn write_preprocessed(work_dir: &Path, image_bytes: &[u8], scale: f32) -> Result<TempImage> {
    let image = preprocess_image(image_bytes, scale)?;
    let png = encode_png(&image)?;

    std::fs::create_dir_all(work_dir)?;
    let path = work_dir.join(format!(
        "ocr-{}-{}.png",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, png)?;

    Ok(TempImage { path })
}

/// スコープを抜けると削除される一時画像
struct TempImage {
    path: PathBuf,
}

impl Drop for TempImage {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// 外部OCRコマンド
#[derive(Debug, Clone)]
pub struct CommandOcr {
    program: String,
    args: Vec<String>,
    scale: f32,
    work_dir: PathBuf,
}

impl CommandOcr {
    pub fn new(program: impl Into<String>, args: Vec<String>, scale: f32) -> Self {
        Self {
            program: program.into(),
            args,
            scale,
            work_dir: default_work_dir(),
        }
    }

    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    fn resolved_args(&self, input: &Path) -> Vec<String> {
        let input = input.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, &input))
            .collect()
    }
}

impl TextExtractor for CommandOcr {
    fn extract_text(&self, image_bytes: &[u8]) -> Result<String> {
        let temp = write_preprocessed(&self.work_dir, image_bytes, self.scale)?;
        let args = self.resolved_args(&temp.path);

        tracing::debug!(program = %self.program, ?args, "running OCR command");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| PrescriptionAiError::OcrExecution(format!("{} 起動エラー: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrescriptionAiError::OcrExecution(format!(
                "{} failed (code {:?}): {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// AI CLIによる手書き文字の書き起こし
#[derive(Debug, Clone)]
pub struct AiVisionOcr {
    provider: AiProvider,
    scale: f32,
    work_dir: PathBuf,
}

impl AiVisionOcr {
    pub fn new(provider: AiProvider, scale: f32) -> Self {
        Self {
            provider,
            scale,
            work_dir: default_work_dir(),
        }
    }

    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }
}

/// 書き起こし用プロンプト（改行をスペースに置換してCLIに渡す）
pub fn build_transcription_prompt(image_path: &Path) -> String {
    let path = image_path.display().to_string().replace('\\', "/");
    let raw_prompt = format!(
        "Read the following image file: {}\n\
         It is a handwritten doctor's prescription.\n\
         Transcribe the handwritten text exactly as written, one line per line of the prescription.\n\
         Output only the transcribed text, with no commentary.",
        path
    );
    raw_prompt.replace('\n', " ")
}

impl TextExtractor for AiVisionOcr {
    fn extract_text(&self, image_bytes: &[u8]) -> Result<String> {
        let temp = write_preprocessed(&self.work_dir, image_bytes, self.scale)?;
        let prompt = build_transcription_prompt(&temp.path);
        let response = self.provider.run_prompt(&prompt)?;
        Ok(response.trim().to_string())
    }
}

use crate::ai_provider::AiProvider;
use crate::error::{PrescriptionAiError, Result};
use crate::ocr::preprocess::{validate_scale, MAX_SCALE};
use crate::ocr::OcrEngine;
use prescription_ai_common::MatchOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// カタログパスの環境変数
pub const ENV_CATALOG_PATH: &str = "RX_CATALOG_PATH";
/// サーバーアドレスの環境変数
pub const ENV_BIND_ADDR: &str = "RX_BIND_ADDR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub bind_addr: String,
    pub match_limit: usize,
    pub match_threshold: f64,
    pub process_case: bool,
    pub ocr_engine: OcrEngine,
    pub ocr_command: String,
    /// `{input}` は前処理済み画像のパスに置換される
    pub ocr_args: Vec<String>,
    pub scale_factor: f32,
    pub ai_provider: AiProvider,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書き
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default_config()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 値の範囲を確認
    pub fn validate(&self) -> Result<()> {
        validate_scale(self.scale_factor)
            .map_err(|_| PrescriptionAiError::Config(format!(
                "scale_factor は 0 より大きく {} 以下で指定してください: {}",
                MAX_SCALE, self.scale_factor
            )))?;
        if !(0.0..=100.0).contains(&self.match_threshold) {
            return Err(PrescriptionAiError::Config(format!(
                "match_threshold は 0〜100 で指定してください: {}",
                self.match_threshold
            )));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PrescriptionAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("prescription-ai").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            catalog_path: PathBuf::from("A_Z_medicines_dataset_of_India.csv"),
            bind_addr: "0.0.0.0:8000".into(),
            match_limit: 5,
            match_threshold: 70.0,
            process_case: false,
            ocr_engine: OcrEngine::Command,
            ocr_command: "tesseract".into(),
            ocr_args: vec!["{input}".into(), "stdout".into()],
            scale_factor: 1.5,
            ai_provider: AiProvider::Claude,
        }
    }

    /// 環境変数を優先
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(ENV_CATALOG_PATH) {
            self.catalog_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
    }

    pub fn set_catalog_path(&mut self, path: PathBuf) -> Result<()> {
        self.catalog_path = path;
        self.save()
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            limit: self.match_limit,
            threshold: self.match_threshold,
            process_case: self.process_case,
        }
    }
}

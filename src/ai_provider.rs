//! AI CLI連携
//!
//! claude / codex / gemini のCLIにプロンプトを渡し、標準出力をテキストとして受け取る。

use crate::error::{PrescriptionAiError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Claude,
    Codex,
    Gemini,
}

impl AiProvider {
    pub fn command_name(&self) -> &'static str {
        match self {
            AiProvider::Claude => "claude",
            AiProvider::Codex => "codex",
            AiProvider::Gemini => "gemini",
        }
    }

    /// 非対話モードの引数（プロンプト本文は標準入力から渡す）
    pub fn prompt_args(&self) -> Vec<String> {
        match self {
            AiProvider::Claude => vec!["-p".into(), "--output-format".into(), "text".into()],
            AiProvider::Codex => vec!["exec".into(), "-".into()],
            AiProvider::Gemini => vec![],
        }
    }

    /// 起動コマンドを組み立てる
    ///
    /// 引数は固定値のみ。外部入力を含むプロンプトは `cmd /c` を経由させない。
    pub fn command(&self) -> Command {
        // Windowsではcmd /c経由
        #[cfg(windows)]
        let mut command = {
            let mut command = Command::new("cmd");
            command.arg("/c").arg(self.command_name());
            command
        };

        #[cfg(not(windows))]
        let mut command = Command::new(self.command_name());

        command
            .args(self.prompt_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// CLIを実行して標準出力を返す
    pub fn run_prompt(&self, prompt: &str) -> Result<String> {
        let mut child = self.command().spawn().map_err(|e| {
            PrescriptionAiError::CliExecution(format!("{} 起動エラー: {}", self.command_name(), e))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).map_err(|e| {
                PrescriptionAiError::CliExecution(format!("{} 入力エラー: {}", self.command_name(), e))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            PrescriptionAiError::CliExecution(format!("{} 実行エラー: {}", self.command_name(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrescriptionAiError::CliExecution(format!(
                "{} failed (code {:?}): {}",
                self.command_name(),
                output.status.code(),
                stderr.trim()
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::debug!(
            provider = self.command_name(),
            chars = response.len(),
            "AI CLI response received"
        );

        Ok(response)
    }
}

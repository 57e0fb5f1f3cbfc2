use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use crate::ocr::OcrEngine;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prescription-ai")]
#[command(about = "手書き処方箋OCR・医薬品カタログ照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (claude/codex/gemini)。省略時は設定ファイルの値
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,

    /// 医薬品カタログ（CSV/XLSX）。省略時は設定ファイルの値
    #[arg(short, long, global = true)]
    pub catalog: Option<PathBuf>,

    /// OCRエンジン (command/ai)
    #[arg(long, global = true)]
    pub ocr_engine: Option<OcrEngine>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP APIサーバーを起動
    Serve {
        /// 待ち受けアドレス（例: 0.0.0.0:8000）
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// 処方箋画像（ファイルまたはフォルダ）を解析
    Analyze {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// 出力ファイル/ディレクトリ（省略時は標準出力にJSON）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (json/excel/both)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// レポートタイトル
        #[arg(short, long, default_value = "処方箋照合結果")]
        title: String,

        /// 1行あたりの候補数
        #[arg(short, long)]
        limit: Option<usize>,

        /// スコア下限（0-100）
        #[arg(long)]
        threshold: Option<f64>,

        /// キャッシュを使用（再OCRをスキップ）
        #[arg(long)]
        use_cache: bool,

        /// 照合した医薬品の情報をAIに問い合わせる
        #[arg(long)]
        info: bool,
    },

    /// テキストをカタログと照合
    Match {
        /// 照合するテキスト（改行区切りで複数行）
        text: Option<String>,

        /// テキストファイルから読み込む
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// 1行あたりの候補数
        #[arg(short, long)]
        limit: Option<usize>,

        /// スコア下限（0-100）
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// 医薬品情報をAIに問い合わせ
    Info {
        /// 医薬品名
        #[arg(required = true)]
        medicines: Vec<String>,
    },

    /// 設定を表示/編集
    Config {
        /// カタログのパスを設定
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExportFormat {
    #[default]
    Json,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use json, excel, or both", s)),
        }
    }
}

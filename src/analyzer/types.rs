use prescription_ai_common::MatchResult;
use serde::{Deserialize, Serialize};

/// 処方箋1枚の解析結果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_name: String,

    #[serde(default)]
    pub file_path: String,

    /// OCRで抽出したテキスト
    #[serde(default)]
    pub extracted_text: String,

    /// 照合候補（行順、行内はスコア降順）
    #[serde(default)]
    pub matches: Vec<MatchResult>,

    /// 画像が読めなかった場合の理由
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// APIレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionAnalysis {
    pub extracted_text: String,
    pub matches: Vec<MatchResult>,
}

//! カタログと照合結果の型定義
//!
//! - CatalogEntry: 医薬品カタログの1行
//! - MatchResult: OCRの1行に対する照合候補
//! - MatchOptions: 照合パラメータ

use serde::{Deserialize, Serialize};

/// 医薬品カタログの1行（読み込み後は不変）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub name: String,
    /// 価格（空欄・数値以外は None）
    pub price: Option<f64>,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pack_size: String,
    pub short_composition1: String,
    pub short_composition2: String,
    /// 販売中止フラグ（空欄・不明値は None）
    pub is_discontinued: Option<bool>,
}

/// 照合結果
///
/// JSONのフィールド名はAPIレスポンスの形式に合わせる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub input_line: String,
    pub matched_name: String,
    /// 類似度スコア (0-100)
    pub score: f64,
    pub price: Option<f64>,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pack_size: String,
    pub short_composition1: String,
    pub short_composition2: String,
    pub is_discontinued: Option<bool>,
}

impl MatchResult {
    /// カタログ行のメタデータをコピーして結果を組み立てる
    pub fn from_entry(input_line: &str, matched_name: &str, score: f64, entry: &CatalogEntry) -> Self {
        Self {
            input_line: input_line.to_string(),
            matched_name: matched_name.to_string(),
            score,
            price: entry.price,
            manufacturer: entry.manufacturer.clone(),
            kind: entry.kind.clone(),
            pack_size: entry.pack_size.clone(),
            short_composition1: entry.short_composition1.clone(),
            short_composition2: entry.short_composition2.clone(),
            is_discontinued: entry.is_discontinued,
        }
    }
}

/// 照合オプション
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// 1行あたりの候補数の上限
    pub limit: usize,
    /// この値未満のスコアは捨てる
    pub threshold: f64,
    /// 小文字化・記号除去してから比較する
    pub process_case: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 70.0,
            process_case: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_json_field_names() {
        let entry = CatalogEntry {
            name: "Aspirin".to_string(),
            price: Some(12.5),
            manufacturer: "Bayer".to_string(),
            kind: "allopathy".to_string(),
            pack_size: "strip of 10 tablets".to_string(),
            short_composition1: "Aspirin (75mg)".to_string(),
            short_composition2: String::new(),
            is_discontinued: Some(false),
        };
        let result = MatchResult::from_entry("asprin", "Aspirin", 92.3, &entry);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["input_line"], "asprin");
        assert_eq!(json["matched_name"], "Aspirin");
        assert_eq!(json["type"], "allopathy");
        assert_eq!(json["pack_size"], "strip of 10 tablets");
        assert_eq!(json["manufacturer"], "Bayer");
        assert_eq!(json["is_discontinued"], false);
        assert_eq!(json["price"], 12.5);
    }

    #[test]
    fn test_missing_metadata_serializes_as_null() {
        let entry = CatalogEntry {
            name: "Crocin".to_string(),
            ..Default::default()
        };
        let result = MatchResult::from_entry("crocin", "Crocin", 100.0, &entry);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json["price"].is_null());
        assert!(json["is_discontinued"].is_null());
        assert_eq!(json["short_composition2"], "");
    }

    #[test]
    fn test_match_options_default() {
        let options = MatchOptions::default();
        assert_eq!(options.limit, 5);
        assert_eq!(options.threshold, 70.0);
        assert!(!options.process_case);
    }
}

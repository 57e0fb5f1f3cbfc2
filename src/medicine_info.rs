//! 医薬品情報の問い合わせ
//!
//! 照合で得た医薬品名について、効果・用量・利点・副作用をAIに尋ねる。

use crate::ai_provider::AiProvider;
use crate::error::Result;

const SYSTEM_INSTRUCTION: &str = "You are a helpful medical assistant.";

/// 問い合わせプロンプトを構築
pub fn build_info_prompt<S: AsRef<str>>(medicines: &[S]) -> String {
    let names = medicines
        .iter()
        .map(|m| m.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{} Provide detailed information (effects, dosage, benefits, side effects) for the following medicines: {}",
        SYSTEM_INSTRUCTION, names
    )
}

/// 医薬品情報を取得
///
/// 名前が空なら問い合わせずに `None`
pub fn get_medicine_info<S: AsRef<str>>(provider: AiProvider, medicines: &[S]) -> Result<Option<String>> {
    let medicines: Vec<&str> = medicines
        .iter()
        .map(|m| m.as_ref().trim())
        .filter(|m| !m.is_empty())
        .collect();

    if medicines.is_empty() {
        return Ok(None);
    }

    let prompt = build_info_prompt(medicines.as_slice());
    let response = provider.run_prompt(&prompt)?;
    Ok(Some(response.trim().to_string()))
}

/// 照合結果から重複なしの医薬品名を出現順に取り出す
pub fn unique_names(matches: &[prescription_ai_common::MatchResult]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for m in matches {
        if !names.contains(&m.matched_name) {
            names.push(m.matched_name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use prescription_ai_common::{CatalogEntry, MatchResult};

    #[test]
    fn test_build_info_prompt() {
        let prompt = build_info_prompt(&["Aspirin", "Dolo 650 Tablet"]);
        assert!(prompt.starts_with("You are a helpful medical assistant."));
        assert!(prompt.ends_with("for the following medicines: Aspirin, Dolo 650 Tablet"));
    }

    #[test]
    fn test_empty_list_skips_call() {
        // 空ならCLIを起動しない
        let empty: [&str; 0] = [];
        assert!(get_medicine_info(AiProvider::Claude, &empty).unwrap().is_none());
        assert!(get_medicine_info(AiProvider::Claude, &["  "]).unwrap().is_none());
    }

    #[test]
    fn test_unique_names_keeps_order() {
        let entry = CatalogEntry::default();
        let matches = vec![
            MatchResult::from_entry("asprin", "Aspirin", 90.0, &entry),
            MatchResult::from_entry("dolo", "Dolo 650 Tablet", 80.0, &entry),
            MatchResult::from_entry("aspirin", "Aspirin", 100.0, &entry),
        ];
        assert_eq!(unique_names(&matches), vec!["Aspirin", "Dolo 650 Tablet"]);
    }
}

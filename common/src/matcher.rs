//! OCRテキストと医薬品カタログの照合
//!
//! 1. テキストを行に分割（前後空白除去、空行は除外）
//! 2. 各行を全医薬品名とトークンソート比率で比較し、上位 `limit` 件を取得
//! 3. `threshold` 未満を除外
//! 4. 同名の最初のカタログ行からメタデータをコピー
//!
//! 入力がどんな文字列でもエラーにはならない。

use crate::catalog::MedicineCatalog;
use crate::similarity::{default_process, rank_candidates, sort_tokens, PreparedQuery};
use crate::types::{MatchOptions, MatchResult};
use std::sync::Arc;

/// クエリ全体の最小文字数（前後空白除去後）
pub const MIN_QUERY_CHARS: usize = 3;

/// カタログ照合器
///
/// 候補名のトークンソート済み文字列を構築時に一度だけ作る。
#[derive(Debug, Clone)]
pub struct Matcher {
    catalog: Arc<MedicineCatalog>,
    options: MatchOptions,
    sorted_names: Vec<Vec<char>>,
}

impl Matcher {
    pub fn new(catalog: Arc<MedicineCatalog>, options: MatchOptions) -> Self {
        let sorted_names = catalog
            .names()
            .iter()
            .map(|name| prepare(name, options.process_case).chars().collect())
            .collect();

        Self {
            catalog,
            options,
            sorted_names,
        }
    }

    pub fn catalog(&self) -> &MedicineCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// 既定の limit / threshold で照合
    pub fn find_matches(&self, query: &str) -> Vec<MatchResult> {
        self.find_matches_with(query, self.options.limit, self.options.threshold)
    }

    /// limit / threshold を指定して照合
    pub fn find_matches_with(&self, query: &str, limit: usize, threshold: f64) -> Vec<MatchResult> {
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let names = self.catalog.names();
        let mut results = Vec::new();

        for line in split_lines(query) {
            let prepared = PreparedQuery::new(&prepare(line, self.options.process_case));
            let ranked = rank_candidates(&prepared, &self.sorted_names, limit, threshold);

            for (index, score) in ranked {
                let matched_name = &names[index];
                if let Some(entry) = self.catalog.first_by_name(matched_name) {
                    results.push(MatchResult::from_entry(line, matched_name, score, entry));
                }
            }
        }

        results
    }
}

/// 照合関数（カタログを直接渡す版）
pub fn find_best_medicine_match(
    catalog: Arc<MedicineCatalog>,
    query: &str,
    limit: usize,
    threshold: f64,
) -> Vec<MatchResult> {
    let options = MatchOptions {
        limit,
        threshold,
        ..Default::default()
    };
    Matcher::new(catalog, options).find_matches(query)
}

/// 改行で分割し、前後空白を除去して空行を除く
pub fn split_lines(query: &str) -> impl Iterator<Item = &str> {
    query.split('\n').map(str::trim).filter(|line| !line.is_empty())
}

fn prepare(text: &str, process_case: bool) -> String {
    if process_case {
        sort_tokens(&default_process(text))
    } else {
        sort_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CSV: &str = "name,price,manufacturer_name,type,pack_size_label,short_composition1,short_composition2,is_discontinued
Paracetamol,20,Cipla Ltd,allopathy,strip of 10 tablets,Paracetamol (500mg),,FALSE
Aspirin,12.5,Bayer,allopathy,strip of 14 tablets,Aspirin (75mg),,FALSE
Amoxicillin,80,Sun Pharma,allopathy,strip of 10 capsules,Amoxycillin (500mg),,TRUE
Aspirin,99,Duplicate Ltd,allopathy,strip of 5 tablets,Aspirin (150mg),,FALSE
";

    fn matcher() -> Matcher {
        let catalog = Arc::new(MedicineCatalog::from_csv_str(TEST_CSV).unwrap());
        Matcher::new(catalog, MatchOptions::default())
    }

    #[test]
    fn test_short_queries_return_nothing() {
        let m = matcher();
        assert!(m.find_matches("").is_empty());
        assert!(m.find_matches("ab").is_empty());
        assert!(m.find_matches("  ab \n ").is_empty());
    }

    #[test]
    fn test_each_line_is_matched() {
        let m = matcher();
        let results = m.find_matches("Paracetamol 500mg\nAspirin");

        let para: Vec<_> = results.iter().filter(|r| r.input_line == "Paracetamol 500mg").collect();
        let asp: Vec<_> = results.iter().filter(|r| r.input_line == "Aspirin").collect();
        assert!(!para.is_empty());
        assert!(!asp.is_empty());
        assert_eq!(para[0].matched_name, "Paracetamol");
        assert_eq!(asp[0].matched_name, "Aspirin");
    }

    #[test]
    fn test_results_follow_line_order() {
        let m = matcher();
        let results = m.find_matches("Aspirin\nParacetamol");
        let first_para = results.iter().position(|r| r.input_line == "Paracetamol").unwrap();
        assert!(results[..first_para].iter().all(|r| r.input_line == "Aspirin"));
    }

    #[test]
    fn test_duplicates_use_first_row_metadata() {
        let m = matcher();
        let results = m.find_matches("Aspirin");

        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.matched_name, "Aspirin");
            assert_eq!(r.manufacturer, "Bayer");
            assert_eq!(r.price, Some(12.5));
        }
    }

    #[test]
    fn test_threshold_and_limit() {
        let m = matcher();
        let results = m.find_matches_with("Aspirin", 1, 70.0);
        assert_eq!(results.len(), 1);

        let results = m.find_matches_with("Zzyzx", 5, 70.0);
        assert!(results.is_empty());

        let results = m.find_matches_with("Aspirn", 5, 0.0);
        assert_eq!(results.len(), 4);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_process_case_option() {
        let catalog = Arc::new(MedicineCatalog::from_csv_str(TEST_CSV).unwrap());
        let strict = Matcher::new(catalog.clone(), MatchOptions::default());
        assert!(strict.find_matches("PARACETAMOL").is_empty());

        let relaxed = Matcher::new(
            catalog,
            MatchOptions {
                process_case: true,
                ..Default::default()
            },
        );
        let results = relaxed.find_matches("PARACETAMOL");
        assert_eq!(results[0].matched_name, "Paracetamol");
        assert_eq!(results[0].score, 100.0);
    }

    #[test]
    fn test_find_best_medicine_match() {
        let catalog = Arc::new(MedicineCatalog::from_csv_str(TEST_CSV).unwrap());
        let results = find_best_medicine_match(catalog, "Amoxicilin", 5, 70.0);
        assert_eq!(results[0].matched_name, "Amoxicillin");
        assert_eq!(results[0].is_discontinued, Some(true));
    }

    #[test]
    fn test_split_lines() {
        let lines: Vec<&str> = split_lines(" a \n\n  \r\nb\r").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }
}

//! 文字列類似度
//!
//! OCRの1行と医薬品名の比較に使う。
//! - ratio: 正規化Indel類似度（挿入・削除のみの編集距離）
//! - token_sort_ratio: 空白区切りのトークンをソートしてから ratio を取る（語順の入れ替えに強い）
//!
//! LCSはパターン長64文字以下ならビット並列、それ以上は2行DPで求める。

use std::cmp::Ordering;
use std::collections::HashMap;

/// 正規化Indel類似度 (0-100)
///
/// 両方空文字なら100
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// トークンソート比率 (0-100)
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

/// 空白で分割してソートし、半角スペース1つで連結する
pub fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// 小文字化し、英数字以外を空白に置き換えて前後を除去する
pub fn default_process(s: &str) -> String {
    let processed: String = s
        .chars()
        .flat_map(|c| -> Vec<char> {
            if c.is_alphanumeric() {
                c.to_lowercase().collect()
            } else {
                vec![' ']
            }
        })
        .collect();
    processed.trim().to_string()
}

/// 全候補を採点し、スコア降順（同点は候補の並び順）で上位 `limit` 件を返す
///
/// `score_cutoff` 未満の候補は含めない。戻り値は (候補インデックス, スコア)。
pub fn extract<S: AsRef<str>>(
    query: &str,
    choices: &[S],
    limit: usize,
    score_cutoff: f64,
) -> Vec<(usize, f64)> {
    let prepared = PreparedQuery::new(&sort_tokens(query));
    let sorted_choices: Vec<Vec<char>> = choices
        .iter()
        .map(|c| sort_tokens(c.as_ref()).chars().collect())
        .collect();
    rank_candidates(&prepared, &sorted_choices, limit, score_cutoff)
}

/// 前処理済みの候補に対して採点・順位付けする
pub fn rank_candidates(
    query: &PreparedQuery,
    choices: &[Vec<char>],
    limit: usize,
    score_cutoff: f64,
) -> Vec<(usize, f64)> {
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f64)> = choices
        .iter()
        .enumerate()
        .map(|(index, choice)| (index, query.score(choice)))
        .filter(|(_, score)| *score >= score_cutoff)
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(limit);
    scored
}

/// 繰り返し比較するクエリ（ビットマスクを一度だけ作る）
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    chars: Vec<char>,
    pattern: Option<PatternMask>,
}

impl PreparedQuery {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let pattern = PatternMask::new(&chars);
        Self { chars, pattern }
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    /// 候補との ratio (0-100)
    pub fn score(&self, choice: &[char]) -> f64 {
        let total = self.chars.len() + choice.len();
        if total == 0 {
            return 100.0;
        }

        let lcs = match &self.pattern {
            Some(pattern) => pattern.lcs(choice),
            None => lcs_length(&self.chars, choice),
        };
        indel_ratio(lcs, total)
    }
}

/// パターン文字ごとの出現位置ビットマスク
#[derive(Debug, Clone)]
struct PatternMask {
    ascii: [u64; 128],
    extended: HashMap<char, u64>,
    len: usize,
}

impl PatternMask {
    /// 空、または64文字を超えるパターンは None
    fn new(chars: &[char]) -> Option<Self> {
        if chars.is_empty() || chars.len() > 64 {
            return None;
        }

        let mut ascii = [0u64; 128];
        let mut extended = HashMap::new();
        for (i, &c) in chars.iter().enumerate() {
            if c.is_ascii() {
                ascii[c as usize] |= 1u64 << i;
            } else {
                *extended.entry(c).or_insert(0u64) |= 1u64 << i;
            }
        }

        Some(Self {
            ascii,
            extended,
            len: chars.len(),
        })
    }

    fn get(&self, c: char) -> u64 {
        if c.is_ascii() {
            self.ascii[c as usize]
        } else {
            self.extended.get(&c).copied().unwrap_or(0)
        }
    }

    /// ビット並列LCS (Hyyrö)
    fn lcs(&self, other: &[char]) -> usize {
        let mut s = !0u64;
        for &c in other {
            let u = s & self.get(c);
            s = s.wrapping_add(u) | s.wrapping_sub(u);
        }

        let mask = if self.len == 64 { !0u64 } else { (1u64 << self.len) - 1 };
        (!s & mask).count_ones() as usize
    }
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    indel_ratio(lcs_length(a, b), total)
}

fn indel_ratio(lcs: usize, total: usize) -> f64 {
    let distance = total - 2 * lcs;
    100.0 * (1.0 - distance as f64 / total as f64)
}

/// 最長共通部分列の長さ
fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if let Some(pattern) = PatternMask::new(a) {
        return pattern.lcs(b);
    }
    if let Some(pattern) = PatternMask::new(b) {
        return pattern.lcs(a);
    }
    lcs_dp(a, b)
}

fn lcs_dp(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

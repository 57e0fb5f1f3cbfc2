//! 医薬品カタログモジュール
//!
//! 起動時に一度だけ表形式ファイル（CSV / Excel）を読み込み、照合に使う。
//! - ヘッダーは前後空白を除去して小文字化
//! - 欠損セルは空文字として扱う
//! - 読み込み後は不変

use crate::error::{Error, Result};
use crate::types::CatalogEntry;
use std::collections::HashMap;
use std::path::Path;

/// 欠損値とみなすセル文字列
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// 医薬品カタログ
#[derive(Debug, Clone, Default)]
pub struct MedicineCatalog {
    entries: Vec<CatalogEntry>,
    /// 照合用の医薬品名（行順）
    names: Vec<String>,
    /// 医薬品名 → 最初に出現した行
    first_index: HashMap<String, usize>,
}

/// 正規化後のヘッダー名 → 列位置
#[derive(Debug)]
struct ColumnMap {
    name: usize,
    price: Option<usize>,
    manufacturer: Option<usize>,
    kind: Option<usize>,
    pack_size: Option<usize>,
    short_composition1: Option<usize>,
    short_composition2: Option<usize>,
    is_discontinued: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |column: &str| headers.iter().position(|h| h == column);

        let name = find("name").ok_or_else(|| Error::MissingColumn("name".into()))?;
        // "price(₹)" のように通貨記号付きのヘッダーも受け付ける
        let price = find("price").or_else(|| headers.iter().position(|h| h.starts_with("price")));

        Ok(Self {
            name,
            price,
            manufacturer: find("manufacturer_name"),
            kind: find("type"),
            pack_size: find("pack_size_label"),
            short_composition1: find("short_composition1"),
            short_composition2: find("short_composition2"),
            is_discontinued: find("is_discontinued"),
        })
    }
}

impl MedicineCatalog {
    /// 拡張子に応じてCSVまたはExcelから読み込み
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::CatalogNotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => Self::from_excel(path),
            _ => Self::from_csv(path),
        }
    }

    /// CSVファイルから読み込み
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::CatalogNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_csv_str(&content)
    }

    /// CSV文字列から読み込み
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut records = parse_csv(content)?.into_iter();

        let headers = records
            .next()
            .ok_or_else(|| Error::MalformedCatalog("no header row".into()))?;

        Self::from_rows(headers, records.collect())
    }

    /// Excelブックの先頭シートから読み込み
    #[cfg(feature = "excel")]
    pub fn from_excel(path: &Path) -> Result<Self> {
        use calamine::{open_workbook_auto, Reader};

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| Error::MalformedCatalog(format!("{}: {}", path.display(), e)))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::MalformedCatalog("workbook has no sheets".into()))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| Error::MalformedCatalog(format!("{}: {}", sheet, e)))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());

        let headers = rows
            .next()
            .ok_or_else(|| Error::MalformedCatalog("no header row".into()))?;

        Self::from_rows(headers, rows.collect())
    }

    #[cfg(not(feature = "excel"))]
    pub fn from_excel(path: &Path) -> Result<Self> {
        Err(Error::UnsupportedFormat(format!(
            "{} (built without the `excel` feature)",
            path.display()
        )))
    }

    /// ヘッダー行とデータ行から構築
    ///
    /// ヘッダーより短い行は空セルで埋める。長い行は不正とする。
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let columns = ColumnMap::resolve(&headers)?;

        let mut entries = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() > headers.len() {
                return Err(Error::MalformedCatalog(format!(
                    "row {}: {} fields, expected {}",
                    i + 1,
                    row.len(),
                    headers.len()
                )));
            }

            let cell = |index: Option<usize>| -> String {
                index
                    .and_then(|idx| row.get(idx))
                    .filter(|value| !NA_VALUES.contains(&value.as_str()))
                    .cloned()
                    .unwrap_or_default()
            };

            entries.push(CatalogEntry {
                name: cell(Some(columns.name)),
                price: parse_price(&cell(columns.price)),
                manufacturer: cell(columns.manufacturer),
                kind: cell(columns.kind),
                pack_size: cell(columns.pack_size),
                short_composition1: cell(columns.short_composition1),
                short_composition2: cell(columns.short_composition2),
                is_discontinued: parse_flag(&cell(columns.is_discontinued)),
            });
        }

        let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        let mut first_index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            first_index.entry(name.clone()).or_insert(i);
        }

        Ok(Self {
            entries,
            names,
            first_index,
        })
    }

    /// 照合用の医薬品名一覧（行順、重複あり）
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 全行を取得
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    /// 名前が一致する最初の行
    pub fn first_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.first_index.get(name).and_then(|&i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 価格セルを数値に変換（桁区切りのカンマと通貨記号は除去）
fn parse_price(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches(&['₹', '$'][..])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" | "discontinued" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "0.0" | "active" => Some(false),
        _ => None,
    }
}

/// CSVをレコード単位に分割（ダブルクォート・"" エスケープ・クォート内改行に対応）
///
/// 空行は読み飛ばす。
fn parse_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::MalformedCatalog(format!(
            "unterminated quoted field at line {}",
            line
        )));
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}

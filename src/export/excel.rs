//! Excel出力
//!
//! 照合候補1件を1行として書き出す。候補のない画像も1行残す。

use crate::analyzer::AnalysisResult;
use crate::error::{PrescriptionAiError, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

const SHEET_NAME: &str = "Matches";

const HEADERS: &[(&str, f64)] = &[
    ("ファイル名", 20.0),
    ("OCR行", 28.0),
    ("医薬品名", 32.0),
    ("スコア", 8.0),
    ("価格", 10.0),
    ("製造元", 30.0),
    ("種類", 12.0),
    ("包装", 22.0),
    ("成分1", 28.0),
    ("成分2", 28.0),
    ("販売中止", 10.0),
];

fn excel_error(e: XlsxError) -> PrescriptionAiError {
    PrescriptionAiError::ExcelGeneration(e.to_string())
}

pub fn generate_excel(results: &[AnalysisResult], output_path: &Path, title: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(excel_error)?;

    write_sheet(worksheet, results, title).map_err(excel_error)?;

    workbook.save(output_path).map_err(excel_error)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, results: &[AnalysisResult], title: &str) -> std::result::Result<(), XlsxError> {
    let title_format = Format::new().set_bold().set_font_size(14);
    let header_format = Format::new().set_bold().set_background_color("#D9E1F2");
    let score_format = Format::new().set_num_format("0.0");

    worksheet.write_string_with_format(0, 0, title, &title_format)?;

    for (col, (label, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(2, col, *label, &header_format)?;
        worksheet.set_column_width(col, *width)?;
    }

    let mut row: u32 = 3;
    for result in results {
        if result.matches.is_empty() {
            worksheet.write_string(row, 0, &result.file_name)?;
            let note = result.error.as_deref().unwrap_or("候補なし");
            worksheet.write_string(row, 2, note)?;
            row += 1;
            continue;
        }

        for m in &result.matches {
            worksheet.write_string(row, 0, &result.file_name)?;
            worksheet.write_string(row, 1, &m.input_line)?;
            worksheet.write_string(row, 2, &m.matched_name)?;
            worksheet.write_number_with_format(row, 3, m.score, &score_format)?;
            if let Some(price) = m.price {
                worksheet.write_number(row, 4, price)?;
            }
            worksheet.write_string(row, 5, &m.manufacturer)?;
            worksheet.write_string(row, 6, &m.kind)?;
            worksheet.write_string(row, 7, &m.pack_size)?;
            worksheet.write_string(row, 8, &m.short_composition1)?;
            worksheet.write_string(row, 9, &m.short_composition2)?;
            if let Some(discontinued) = m.is_discontinued {
                worksheet.write_boolean(row, 10, discontinued)?;
            }
            row += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prescription_ai_common::{CatalogEntry, MatchResult};

    #[test]
    fn test_generate_excel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let entry = CatalogEntry {
            name: "Aspirin".into(),
            price: Some(12.5),
            is_discontinued: Some(false),
            ..Default::default()
        };
        let results = vec![
            AnalysisResult {
                file_name: "rx1.jpg".into(),
                extracted_text: "Asprin".into(),
                matches: vec![MatchResult::from_entry("Asprin", "Aspirin", 92.3, &entry)],
                ..Default::default()
            },
            AnalysisResult {
                file_name: "rx2.jpg".into(),
                error: Some("画像ファイルを開けません".into()),
                ..Default::default()
            },
        ];

        generate_excel(&results, &path, "処方箋照合結果").unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}

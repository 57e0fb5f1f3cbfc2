pub mod excel;

use crate::analyzer::AnalysisResult;
use crate::cli::ExportFormat;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// JSONレポート
#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    generated_at: String,
    results: &'a [AnalysisResult],
}

fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.to_path_buf()
    }
}

fn output_paths_for_both(output: &Path, title: &str) -> (PathBuf, PathBuf) {
    if output.is_dir() || output.extension().is_none() {
        let json_path = output.join(format!("{}.json", title));
        let excel_path = output.join(format!("{}.xlsx", title));
        (json_path, excel_path)
    } else {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(title);
        let json_path = parent.join(format!("{}.json", stem));
        let excel_path = parent.join(format!("{}.xlsx", stem));
        (json_path, excel_path)
    }
}

pub fn generate_json(results: &[AnalysisResult], output_path: &Path, title: &str) -> Result<()> {
    let report = JsonReport {
        title,
        generated_at: chrono::Utc::now().to_rfc3339(),
        results,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// 出力先ディレクトリがなければ作成
fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn export_results(
    results: &[AnalysisResult],
    format: &ExportFormat,
    output: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    match format {
        ExportFormat::Json => {
            let output_path = output_path_for_format(output, title, "json");
            ensure_parent(&output_path)?;
            generate_json(results, &output_path, title)?;
            println!("✔ JSON出力: {}", output_path.display());
            written.push(output_path);
        }
        ExportFormat::Excel => {
            let output_path = output_path_for_format(output, title, "xlsx");
            ensure_parent(&output_path)?;
            println!("- Excelを生成中...");
            excel::generate_excel(results, &output_path, title)?;
            println!("✔ Excel出力: {}", output_path.display());
            written.push(output_path);
        }
        ExportFormat::Both => {
            let (json_path, excel_path) = output_paths_for_both(output, title);
            ensure_parent(&json_path)?;

            generate_json(results, &json_path, title)?;
            println!("✔ JSON出力: {}", json_path.display());

            println!("- Excelを生成中...");
            excel::generate_excel(results, &excel_path, title)?;
            println!("✔ Excel出力: {}", excel_path.display());

            written.push(json_path);
            written.push(excel_path);
        }
    }

    Ok(written)
}

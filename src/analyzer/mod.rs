//! 処方箋解析パイプライン
//!
//! 画像 → OCR → カタログ照合

mod types;

pub use types::{AnalysisResult, PrescriptionAnalysis};

use crate::error::Result;
use crate::ocr::cache::{compute_hash, CacheFile};
use crate::ocr::{self, TextExtractor};
use crate::scanner::ImageInfo;
use indicatif::{ProgressBar, ProgressStyle};
use prescription_ai_common::Matcher;
use std::path::Path;

/// 画像バイト列を解析
pub fn analyze_prescription(
    extractor: &dyn TextExtractor,
    matcher: &Matcher,
    image_bytes: &[u8],
) -> Result<PrescriptionAnalysis> {
    let extracted_text = ocr::extract_text(extractor, image_bytes)?;
    let matches = matcher.find_matches(&extracted_text);

    Ok(PrescriptionAnalysis {
        extracted_text,
        matches,
    })
}

/// 複数画像を順に解析
///
/// 読めない画像（入力エラー）は結果の `error` に記録して続行し、
/// それ以外のエラーで中断する。
pub fn analyze_images(
    images: &[ImageInfo],
    extractor: &dyn TextExtractor,
    matcher: &Matcher,
    verbose: bool,
) -> Result<Vec<AnalysisResult>> {
    analyze_images_inner(images, extractor, matcher, None, verbose)
}

/// キャッシュを使用して解析（キャッシュは `cache_dir` に保存）
pub fn analyze_images_with_cache(
    images: &[ImageInfo],
    cache_dir: &Path,
    extractor: &dyn TextExtractor,
    matcher: &Matcher,
    verbose: bool,
) -> Result<Vec<AnalysisResult>> {
    let mut cache = CacheFile::load(cache_dir);
    let cached_before = cache.len();

    let results = analyze_images_inner(images, extractor, matcher, Some(&mut cache), verbose)?;

    if cache.len() != cached_before {
        cache.save(cache_dir)?;
    }
    Ok(results)
}

fn analyze_images_inner(
    images: &[ImageInfo],
    extractor: &dyn TextExtractor,
    matcher: &Matcher,
    mut cache: Option<&mut CacheFile>,
    verbose: bool,
) -> Result<Vec<AnalysisResult>> {
    let progress = ProgressBar::new(images.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut results = Vec::with_capacity(images.len());

    for image in images {
        progress.set_message(image.file_name.clone());

        let bytes = std::fs::read(&image.path)?;
        let hash = compute_hash(&bytes);

        let cached = cache.as_ref().and_then(|c| c.get(&hash).map(str::to_string));
        let text = match cached {
            Some(text) => {
                if verbose {
                    progress.println(format!("  キャッシュ使用: {}", image.file_name));
                }
                Ok(text)
            }
            None => ocr::extract_text(extractor, &bytes),
        };

        let mut result = AnalysisResult {
            file_name: image.file_name.clone(),
            file_path: image.path.display().to_string(),
            ..Default::default()
        };

        match text {
            Ok(text) => {
                if let Some(cache) = cache.as_deref_mut() {
                    if cache.get(&hash).is_none() {
                        cache.insert(hash, image.file_name.clone(), bytes.len() as u64, text.clone());
                    }
                }
                result.matches = matcher.find_matches(&text);
                result.extracted_text = text;
            }
            Err(e) if e.is_validation() => {
                progress.println(format!("  ⚠ {}: {}", image.file_name, e));
                result.error = Some(e.to_string());
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        }

        if verbose {
            progress.println(format!(
                "  {}: {}行 → {}件",
                image.file_name,
                result.extracted_text.lines().filter(|l| !l.trim().is_empty()).count(),
                result.matches.len()
            ));
        }

        results.push(result);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(results)
}

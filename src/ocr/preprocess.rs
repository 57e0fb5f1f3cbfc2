//! OCR前処理
//!
//! 1. バイト列をデコードしてグレースケール化
//! 2. 平均輝度で二値化（平均未満→黒、以上→白）
//! 3. Lanczos3で拡大（既定1.5倍）

use crate::error::{PrescriptionAiError, Result};
use image::imageops::FilterType;
use image::{GrayImage, ImageFormat};
use std::io::Cursor;

/// 既定の拡大率
pub const DEFAULT_SCALE: f32 = 1.5;

/// 拡大率の上限
pub const MAX_SCALE: f32 = 8.0;

/// 拡大率が (0, MAX_SCALE] に収まっているか確認
pub fn validate_scale(scale: f32) -> Result<f32> {
    if scale.is_finite() && scale > 0.0 && scale <= MAX_SCALE {
        Ok(scale)
    } else {
        Err(PrescriptionAiError::ImageProcessing(format!(
            "scale factor must be in (0, {}]: {}",
            MAX_SCALE, scale
        )))
    }
}

/// 画像バイト列を前処理済みのグレースケール画像にする
///
/// デコードできない場合は `ImageDecode`（入力エラー扱い）
pub fn preprocess_image(bytes: &[u8], scale: f32) -> Result<GrayImage> {
    let scale = validate_scale(scale)?;
    let image = image::load_from_memory(bytes)
        .map_err(|e| PrescriptionAiError::ImageDecode(e.to_string()))?;

    let gray = image.to_luma8();
    let binary = binarize(&gray);
    Ok(upscale(&binary, scale))
}

/// 平均輝度
pub fn mean_intensity(image: &GrayImage) -> f64 {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    sum as f64 / pixels.len() as f64
}

/// 平均輝度をしきい値として二値化
pub fn binarize(image: &GrayImage) -> GrayImage {
    let threshold = mean_intensity(image);
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel.0[0] = if (pixel.0[0] as f64) < threshold { 0 } else { 255 };
    }
    output
}

/// 拡大（幅・高さは小数点以下切り捨て、最小1px）
pub fn upscale(image: &GrayImage, scale: f32) -> GrayImage {
    let width = ((image.width() as f32 * scale) as u32).max(1);
    let height = ((image.height() as f32 * scale) as u32).max(1);
    image::imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// PNGにエンコード
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PrescriptionAiError::ImageProcessing(e.to_string()))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / width.max(1)) as u8]))
    }

    #[test]
    fn test_binarize_uses_mean() {
        let image = GrayImage::from_raw(4, 1, vec![10, 20, 200, 250]).unwrap();
        // 平均 120
        let binary = binarize(&image);
        assert_eq!(binary.as_raw(), &vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_binarize_uniform_image_is_white() {
        let image = GrayImage::from_pixel(3, 3, Luma([128]));
        let binary = binarize(&image);
        assert!(binary.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_upscale_dimensions() {
        let image = gradient(11, 7);
        let scaled = upscale(&image, 1.5);
        assert_eq!(scaled.dimensions(), (16, 10));
    }

    #[test]
    fn test_preprocess_round_trip_png() {
        let png = encode_png(&gradient(20, 10)).unwrap();
        let processed = preprocess_image(&png, DEFAULT_SCALE).unwrap();
        assert_eq!(processed.dimensions(), (30, 15));
    }

    #[test]
    fn test_invalid_scale_is_rejected_before_resize() {
        let png = encode_png(&gradient(4, 4)).unwrap();
        for scale in [f32::INFINITY, f32::NAN, 0.0, -1.0, 1e9] {
            let err = preprocess_image(&png, scale).unwrap_err();
            assert!(matches!(err, PrescriptionAiError::ImageProcessing(_)), "{}", scale);
            assert!(!err.is_validation());
        }
        assert!(preprocess_image(&png, MAX_SCALE).is_ok());
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        let err = preprocess_image(b"%PDF-1.4 not an image", DEFAULT_SCALE).unwrap_err();
        assert!(matches!(err, PrescriptionAiError::ImageDecode(_)));
        assert!(err.is_validation());
    }
}

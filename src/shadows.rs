use crate::error::{StageFailure, StageResult};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixels at or below this intensity count as dark. Inverted threshold: the
/// dark side of the binarization is the foreground class.
pub const DARK_INTENSITY_CEILING: u8 = 60;

/// Dark-pixel ratio above which (strictly) shadows are reported.
pub const SHADOW_RATIO_THRESHOLD: f64 = 0.15;

/// Tunables for the shadow heuristic. Defaults preserve the reference
/// behavior; override them through the analyzer builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    pub dark_intensity_ceiling: u8,
    pub shadow_ratio_threshold: f64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            dark_intensity_ceiling: DARK_INTENSITY_CEILING,
            shadow_ratio_threshold: SHADOW_RATIO_THRESHOLD,
        }
    }
}

/// Outcome of the lighting heuristic. Serialized verbatim into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ShadowVerdict {
    /// Enough dark area to help estimate time of day and sun position.
    ShadowsDetected,
    LittleShadow,
}

/// Decodes the image and classifies its shadow content. Fails only when the
/// file is not decodable as a pixel grid.
pub fn analyze_shadows(path: &Path, config: ShadowConfig) -> StageResult<ShadowVerdict> {
    let image = image::open(path)
        .map_err(|e| StageFailure::DataQuality(format!("image not decodable: {e}")))?;
    Ok(classify_shadows(&image, config))
}

/// Pure pixel computation: grayscale, binarize at the dark ceiling
/// (inclusive), compare the dark ratio against the threshold (strict).
pub fn classify_shadows(image: &DynamicImage, config: ShadowConfig) -> ShadowVerdict {
    let gray = image.to_luma8();
    let total = u64::from(gray.width()) * u64::from(gray.height());
    if total == 0 {
        return ShadowVerdict::LittleShadow;
    }

    let dark = gray
        .pixels()
        .filter(|pixel| pixel.0[0] <= config.dark_intensity_ceiling)
        .count() as u64;
    let dark_ratio = dark as f64 / total as f64;

    if dark_ratio > config.shadow_ratio_threshold {
        ShadowVerdict::ShadowsDetected
    } else {
        ShadowVerdict::LittleShadow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::io::Write;

    /// 10x10 grayscale image with the first `dark` pixels at intensity 0 and
    /// the rest at 200.
    fn synthetic(dark: u32) -> DynamicImage {
        let img = GrayImage::from_fn(10, 10, |x, y| {
            if y * 10 + x < dark {
                Luma([0u8])
            } else {
                Luma([200u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn exactly_fifteen_percent_dark_is_little_shadow() {
        // Ratio comparison is strict: 0.15 is not > 0.15.
        let verdict = classify_shadows(&synthetic(15), ShadowConfig::default());
        assert_eq!(verdict, ShadowVerdict::LittleShadow);
    }

    #[test]
    fn sixteen_percent_dark_detects_shadows() {
        let verdict = classify_shadows(&synthetic(16), ShadowConfig::default());
        assert_eq!(verdict, ShadowVerdict::ShadowsDetected);
    }

    #[test]
    fn intensity_threshold_is_inclusive() {
        // All pixels at exactly the ceiling count as dark.
        let img = GrayImage::from_pixel(10, 10, Luma([DARK_INTENSITY_CEILING]));
        let verdict = classify_shadows(&DynamicImage::ImageLuma8(img), ShadowConfig::default());
        assert_eq!(verdict, ShadowVerdict::ShadowsDetected);

        // One above the ceiling counts as light.
        let img = GrayImage::from_pixel(10, 10, Luma([DARK_INTENSITY_CEILING + 1]));
        let verdict = classify_shadows(&DynamicImage::ImageLuma8(img), ShadowConfig::default());
        assert_eq!(verdict, ShadowVerdict::LittleShadow);
    }

    #[test]
    fn uniformly_lit_image_has_little_shadow() {
        let img = GrayImage::from_pixel(32, 32, Luma([128u8]));
        let verdict = classify_shadows(&DynamicImage::ImageLuma8(img), ShadowConfig::default());
        assert_eq!(verdict, ShadowVerdict::LittleShadow);
    }

    #[test]
    fn undecodable_file_is_a_stage_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not pixels").unwrap();

        let result = analyze_shadows(file.path(), ShadowConfig::default());
        assert!(matches!(result, Err(StageFailure::DataQuality(_))));
    }
}

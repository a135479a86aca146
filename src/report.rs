use crate::shadows::ShadowVerdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// GPS block of the report: decimal coordinates plus the raw EXIF tags they
/// were resolved from. `lat` and `lon` are either both present or both null.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GpsReport {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub raw: BTreeMap<String, String>,
}

/// The finished forensic report for one photograph.
///
/// Every field except `content_hash` is independently nullable: a failed
/// stage leaves its own field empty and touches nothing else. The report is
/// created exactly once per invocation and never updated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisReport {
    /// Camera make / model / software tags, empty when absent.
    pub camera_info: BTreeMap<String, String>,
    pub gps: GpsReport,
    /// Original capture timestamp, verbatim as recorded in the metadata.
    pub capture_time: Option<String>,
    /// Space-joined recognized text fragments in engine order.
    pub ocr_text: Option<String>,
    /// ISO-639 code of the recognized text; null whenever `ocr_text` is
    /// null or empty.
    pub ocr_language: Option<String>,
    /// Human-readable place description from reverse geocoding.
    pub detected_location: Option<String>,
    /// One caption from the fixed scene catalog.
    pub image_description: Option<String>,
    pub shadow_info: Option<ShadowVerdict>,
    /// Hex digest of the file bytes.
    pub content_hash: Option<String>,
    /// Static provider → URL table for manual reverse image search.
    pub search_matches: BTreeMap<String, String>,
    /// UTC time the pipeline finished assembling this report.
    pub analyzed_at: DateTime<Utc>,
}

/// Static reverse-image-search entry points. Nothing here is inferred from
/// the image; the URLs are starting points for a manual lookup.
pub fn search_matches() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "google_reverse_image".to_string(),
        "https://images.google.com/searchbyimage?image_content=UPLOAD_YOUR_IMAGE".to_string(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_spec_field_names() {
        let report = AnalysisReport {
            camera_info: BTreeMap::new(),
            gps: GpsReport {
                lat: Some(40.446),
                lon: Some(-79.982),
                raw: BTreeMap::new(),
            },
            capture_time: None,
            ocr_text: None,
            ocr_language: None,
            detected_location: None,
            image_description: None,
            shadow_info: Some(ShadowVerdict::LittleShadow),
            content_hash: Some("ab".repeat(32)),
            search_matches: search_matches(),
            analyzed_at: Utc::now(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["camera_info"], serde_json::json!({}));
        assert_eq!(json["gps"]["lat"], 40.446);
        assert_eq!(json["gps"]["lon"], -79.982);
        assert!(json["ocr_text"].is_null());
        assert_eq!(json["shadow_info"], "LittleShadow");
        assert!(
            json["search_matches"]["google_reverse_image"]
                .as_str()
                .unwrap()
                .starts_with("https://images.google.com/")
        );
    }

    #[test]
    fn non_ascii_survives_serialization_unescaped() {
        let mut report_location = BTreeMap::new();
        report_location.insert("note".to_string(), "São Paulo, Brasil".to_string());
        let json = serde_json::to_string_pretty(&report_location).unwrap();
        assert!(json.contains("São Paulo"), "serde_json must not escape non-ASCII");
    }
}

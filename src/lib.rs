//! # Image Recon
//!
//! Produce a forensic analysis report from a single photograph, for
//! investigative (OSINT) use.
//!
//! The pipeline fuses independently fallible signals into one structured
//! report: embedded capture metadata, GPS coordinates resolved to a place
//! name, recovered visible text with its language, a zero-shot scene label,
//! a lighting/shadow heuristic, and a content fingerprint of the file bytes.
//!
//! ## Key Properties
//!
//! - **Fail-soft isolation**: every stage is isolated at its boundary. A
//!   network outage, a corrupt tag block or a missing model nulls that one
//!   report field and nothing else.
//! - **Concurrent fan-out**: stages run concurrently, respecting only the
//!   two real data dependencies (GPS tags feed coordinate resolution,
//!   recognized text feeds language detection), with a bounded timeout per
//!   external provider.
//! - **Opaque capability providers**: the OCR engine, scene model and
//!   reverse geocoder are consumed, not reimplemented. Heavy model state is
//!   loaded lazily once per process and shared read-only.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use image_recon::analyzer::ImageAnalyzer;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = ImageAnalyzer::builder().build()?;
//!     let report = analyzer.analyze_image(Path::new("photo.jpg")).await?;
//!
//!     println!("Location: {:?}", report.detected_location);
//!     println!("Scene: {:?}", report.image_description);
//!     println!("Fingerprint: {:?}", report.content_hash);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod coordinates;
pub mod error;
pub mod fingerprint;
pub mod geocode;
pub mod language;
pub mod metadata;
pub mod ocr;
pub mod report;
pub mod scene;
pub mod shadows;

pub use analyzer::ImageAnalyzer;
pub use error::{AnalyzerError, StageFailure, StageResult};
pub use report::AnalysisReport;

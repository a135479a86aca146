use crate::error::{AnalyzerError, StageFailure, StageResult};
use crate::geocode::{self, NominatimClient};
use crate::metadata::{self, ExifSummary};
use crate::ocr::{self, TesseractOcr};
use crate::report::{self, AnalysisReport, GpsReport};
use crate::scene::SceneClassifier;
use crate::shadows::{self, ShadowConfig};
use crate::{coordinates, fingerprint, language};
use bon::bon;
use chrono::Utc;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;
use tokio::time::timeout;

/// The main entry point for the photo analysis pipeline.
///
/// Holds the initialized clients and configuration needed to assemble a
/// report. It is designed to be created once and reused for analyzing
/// multiple files; the heavyweight scene model additionally lives in a
/// process-wide lazy singleton shared by every instance.
///
/// ```rust,no_run
/// use image_recon::analyzer::ImageAnalyzer;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let analyzer = ImageAnalyzer::builder().build()?;
/// let report = analyzer.analyze_image(Path::new("photo.jpg")).await?;
/// println!("{}", serde_json::to_string_pretty(&report)?);
/// # Ok(())
/// # }
/// ```
pub struct ImageAnalyzer {
    geocoder: NominatimClient,
    ocr: TesseractOcr,
    scene: SceneClassifier,
    shadow_config: ShadowConfig,
    stage_timeout: Duration,
}

#[bon]
impl ImageAnalyzer {
    /// Constructs an `ImageAnalyzer` via a builder pattern.
    ///
    /// # Builder Arguments
    ///
    /// * `geocoder_base_url: Option<String>` - Reverse-geocoding endpoint. Defaults to the public Nominatim instance.
    /// * `geocoder_language: String` - (Default: `"en"`) Preferred language for resolved place names.
    /// * `tesseract_path: Option<PathBuf>` - OCR executable. Defaults to `tesseract` on the PATH.
    /// * `ocr_languages: String` - (Default: [`ocr::DEFAULT_LANGUAGES`]) Language models loaded for recognition.
    /// * `scene_model_dir: Option<PathBuf>` - Directory holding `model.onnx` + `tokenizer.json` for scene classification. Without it the stage degrades to null.
    /// * `shadow_config: ShadowConfig` - Shadow heuristic thresholds; defaults preserve the reference constants.
    /// * `stage_timeout: Duration` - (Default: 10s) Bound on every external-provider stage; expiry is recorded as a stage failure.
    ///
    /// # Errors
    ///
    /// Fails only when the HTTP client cannot be initialized.
    #[builder]
    pub fn new(
        geocoder_base_url: Option<String>,
        #[builder(default = "en".to_string())] geocoder_language: String,
        tesseract_path: Option<PathBuf>,
        #[builder(default = ocr::DEFAULT_LANGUAGES.to_string())] ocr_languages: String,
        scene_model_dir: Option<PathBuf>,
        #[builder(default)] shadow_config: ShadowConfig,
        #[builder(default = Duration::from_secs(10))] stage_timeout: Duration,
    ) -> Result<Self, AnalyzerError> {
        let geocoder = NominatimClient::new(
            geocoder_base_url.unwrap_or_else(|| geocode::DEFAULT_BASE_URL.to_string()),
            geocoder_language,
            stage_timeout,
        )?;
        let ocr = TesseractOcr::new(
            tesseract_path.unwrap_or_else(|| PathBuf::from("tesseract")),
            ocr_languages,
        );
        let scene = SceneClassifier::new(scene_model_dir);
        Ok(Self {
            geocoder,
            ocr,
            scene,
            shadow_config,
            stage_timeout,
        })
    }

    /// Runs every analysis stage over `image_file` and assembles the report.
    ///
    /// Stages fan out concurrently, respecting the two real data
    /// dependencies (coordinates need the raw GPS tags, language detection
    /// needs the recognized text) and joining before assembly. Each stage is
    /// isolated: a failure inside one stage nulls its own report field and
    /// nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InputUnreadable`] when the file cannot be
    /// opened or read at all — the one total failure that is not expressible
    /// as a report.
    pub async fn analyze_image(&self, image_file: &Path) -> Result<AnalysisReport, AnalyzerError> {
        // Preflight: an unreadable input is a distinguished outcome, not an
        // all-null report.
        File::open(image_file).map_err(|source| AnalyzerError::InputUnreadable {
            path: image_file.to_path_buf(),
            source,
        })?;

        let exif_chain = async {
            let path = image_file.to_path_buf();
            let summary = task::spawn_blocking(move || metadata::extract_metadata(&path))
                .await
                .unwrap_or_default();
            let resolved = coordinates::resolve_coordinates(&summary.gps_raw);
            let detected_location = match resolved {
                Some((lat, lon)) => settle(
                    "geo_lookup",
                    self.bounded(self.geocoder.reverse(lat, lon)).await,
                ),
                None => None,
            };
            (summary, resolved, detected_location)
        };

        let text_chain = async {
            let ocr_text = settle(
                "text_extractor",
                self.bounded(self.ocr.recognize(image_file)).await,
            );
            let ocr_language = ocr_text.as_deref().and_then(language::detect_language);
            (ocr_text, ocr_language)
        };

        let scene_stage = async {
            let path = image_file.to_path_buf();
            // Cloning is cheap: the loaded model lives in a process-wide
            // singleton, the classifier only carries configuration.
            let classifier = self.scene.clone();
            settle(
                "scene_classifier",
                self.bounded(async {
                    flatten_join(
                        task::spawn_blocking(move || classifier.classify(&path)).await,
                    )
                })
                .await,
            )
        };

        let shadow_stage = async {
            let path = image_file.to_path_buf();
            let config = self.shadow_config;
            settle(
                "shadow_heuristic",
                flatten_join(
                    task::spawn_blocking(move || shadows::analyze_shadows(&path, config)).await,
                ),
            )
        };

        let fingerprint_stage = async {
            let path = image_file.to_path_buf();
            match task::spawn_blocking(move || fingerprint::hash_file(&path)).await {
                Ok(result) => result,
                Err(join_error) => Err(std::io::Error::other(join_error)),
            }
        };

        let (
            (summary, resolved, detected_location),
            (ocr_text, ocr_language),
            image_description,
            shadow_info,
            content_hash,
        ) = tokio::join!(
            exif_chain,
            text_chain,
            scene_stage,
            shadow_stage,
            fingerprint_stage
        );

        // The fingerprint only fails on an unreadable file; never publish a
        // partial report in that case.
        let content_hash = content_hash.map_err(|source| AnalyzerError::InputUnreadable {
            path: image_file.to_path_buf(),
            source,
        })?;

        let ExifSummary {
            camera_info,
            gps_raw,
            capture_time,
        } = summary;
        let (lat, lon) = match resolved {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };

        Ok(AnalysisReport {
            camera_info,
            gps: GpsReport {
                lat,
                lon,
                raw: gps_raw,
            },
            capture_time,
            ocr_text,
            ocr_language,
            detected_location,
            image_description,
            shadow_info,
            content_hash: Some(content_hash),
            search_matches: report::search_matches(),
            analyzed_at: Utc::now(),
        })
    }

    /// Bounds an external-provider stage; expiry is just another stage
    /// failure.
    async fn bounded<T>(
        &self,
        stage: impl Future<Output = StageResult<T>>,
    ) -> StageResult<T> {
        match timeout(self.stage_timeout, stage).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StageFailure::TimedOut(self.stage_timeout)),
        }
    }
}

/// Settles one stage outcome into its report field, logging degradations at
/// the boundary. Provider outages are warnings so they stay distinguishable
/// from ordinary data-quality misses in telemetry.
fn settle<T>(stage: &str, outcome: StageResult<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(failure) => {
            match failure {
                StageFailure::ServiceUnavailable(_) | StageFailure::TimedOut(_) => {
                    tracing::warn!(stage, error = %failure, "stage degraded, field left null");
                }
                StageFailure::DataQuality(_) => {
                    tracing::debug!(stage, error = %failure, "stage found nothing, field left null");
                }
            }
            None
        }
    }
}

fn flatten_join<T>(joined: Result<StageResult<T>, task::JoinError>) -> StageResult<T> {
    match joined {
        Ok(outcome) => outcome,
        Err(join_error) => Err(StageFailure::ServiceUnavailable(join_error.to_string())),
    }
}

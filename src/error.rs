use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the image-recon crate.
///
/// Only total failures surface here; anything a single pipeline stage can
/// recover from is a [`StageFailure`] and ends up as a null report field.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The input file could not be opened or read at all. Distinguished from
    /// an all-null report: nothing was analyzed.
    #[error("input file is not readable: {}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client initialization failed")]
    Http(#[from] reqwest::Error),
}

/// Why a single pipeline stage produced no value.
///
/// Stage failures never abort the report. The assembler catches them at the
/// stage boundary, records the corresponding field as null and keeps going,
/// so the fail-soft contract is visible in the type rather than implied by
/// swallowed exceptions.
#[derive(Error, Debug)]
pub enum StageFailure {
    /// An external provider (geocoder, OCR engine, scene model) was
    /// unreachable, rate-limited or failed to initialize.
    #[error("external service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The stage's bounded timeout expired before the provider answered.
    #[error("stage timed out after {0:?}")]
    TimedOut(Duration),

    /// The input was readable but yielded nothing usable for this stage.
    #[error("no usable data: {0}")]
    DataQuality(String),
}

pub type StageResult<T> = Result<T, StageFailure>;

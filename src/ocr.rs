use crate::error::{StageFailure, StageResult};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Language models loaded simultaneously for every recognition pass.
pub const DEFAULT_LANGUAGES: &str = "eng+por+spa+fra+deu+ita";

/// Text extraction backed by the `tesseract` CLI.
///
/// The engine is consumed as an opaque capability: we hand it the image and
/// take its fragments in return order, with no confidence filtering. A
/// missing binary or a failed run degrades to a [`StageFailure`] and a null
/// `ocr_text` field.
pub struct TesseractOcr {
    executable: PathBuf,
    languages: String,
}

impl TesseractOcr {
    pub fn new(executable: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            languages: languages.into(),
        }
    }

    /// Runs OCR over `image` and joins the recognized fragments with a
    /// single space. An empty string means the engine ran but saw no text;
    /// that is a successful outcome, not a failure.
    pub async fn recognize(&self, image: &Path) -> StageResult<String> {
        let output = Command::new(&self.executable)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .await
            .map_err(|e| {
                StageFailure::ServiceUnavailable(format!(
                    "tesseract did not start ({}): {e}",
                    self.executable.display()
                ))
            })?;

        if !output.status.success() {
            return Err(StageFailure::ServiceUnavailable(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(join_fragments(text.lines()))
    }
}

/// Joins non-empty fragments with single spaces, preserving engine order.
fn join_fragments<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

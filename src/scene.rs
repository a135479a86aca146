use crate::error::{StageFailure, StageResult};
use std::path::{Path, PathBuf};

/// The candidate scene captions, zero-shot-matched against the image.
///
/// This catalog is closed and versioned: classification returns the caption
/// at the best-scoring index, so adding, removing or reordering entries is a
/// compatibility-breaking change for every stored report.
pub const SCENE_PROMPTS: [&str; 31] = [
    "a photo of a city",
    "a photo of a beach",
    "a photo of a famous monument",
    "a photo of a mountain",
    "a photo of a street sign",
    "a photo of a person",
    "a photo of a building",
    "a photo of a forest",
    "a photo of a desert",
    "a photo of a river",
    "a photo of a stadium",
    "a photo of a car",
    "a photo of a train station",
    "a photo of a bus stop",
    "a photo of a restaurant",
    "a photo of a hotel",
    "a photo of a church",
    "a photo of a mosque",
    "a photo of a temple",
    "a photo of a bridge",
    "a photo of a tower",
    "a photo of a castle",
    "a photo of a school",
    "a photo of a university",
    "a photo of a hospital",
    "a photo of a police station",
    "a photo of a fire station",
    "a photo of a shopping mall",
    "a photo of a park",
    "a photo of a zoo",
    "a photo of a museum",
];

/// Index of the maximum score; on ties the first occurrence wins.
/// NaN scores never win: degenerate model output is skipped so the
/// first-max selection stays well-defined.
pub fn best_prompt_index(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Zero-shot scene classification against [`SCENE_PROMPTS`].
///
/// The similarity model is an optional capability: with the `onnx-scene`
/// feature enabled and a model directory configured, a CLIP-style ONNX model
/// scores the image against every caption. Otherwise the stage degrades and
/// the report's `image_description` stays null.
#[derive(Clone)]
pub struct SceneClassifier {
    model_dir: Option<PathBuf>,
}

impl SceneClassifier {
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        Self { model_dir }
    }

    /// Classifies the image, returning the caption at the best-scoring
    /// catalog index.
    pub fn classify(&self, image_path: &Path) -> StageResult<String> {
        let scores = self.score_prompts(image_path)?;
        best_prompt_index(&scores)
            .map(|index| SCENE_PROMPTS[index].to_string())
            .ok_or_else(|| StageFailure::DataQuality("model returned no scores".into()))
    }

    #[cfg(feature = "onnx-scene")]
    fn score_prompts(&self, image_path: &Path) -> StageResult<Vec<f32>> {
        let model_dir = self.model_dir.as_deref().ok_or_else(|| {
            StageFailure::ServiceUnavailable("no scene model directory configured".into())
        })?;
        let scorer = clip::shared(model_dir)?;
        let image = image::open(image_path)
            .map_err(|e| StageFailure::DataQuality(format!("image not decodable: {e}")))?;
        scorer.score(&image, &SCENE_PROMPTS)
    }

    #[cfg(not(feature = "onnx-scene"))]
    fn score_prompts(&self, _image_path: &Path) -> StageResult<Vec<f32>> {
        let _ = &self.model_dir;
        Err(StageFailure::ServiceUnavailable(
            "built without the onnx-scene feature".into(),
        ))
    }
}

#[cfg(feature = "onnx-scene")]
mod clip {
    use super::StageFailure;
    use crate::error::StageResult;
    use image::DynamicImage;
    use ort::session::Session;
    use std::path::Path;
    use std::sync::{Arc, Mutex, OnceLock};

    /// CLIP input resolution and normalization constants.
    const IMAGE_SIZE: u32 = 224;
    const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
    const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

    /// Loading the model is expensive, so the process shares one read-only
    /// instance across all invocations. The directory passed on first use
    /// wins; later calls reuse the loaded model.
    static SHARED: OnceLock<Option<Arc<ClipScorer>>> = OnceLock::new();

    pub fn shared(model_dir: &Path) -> StageResult<Arc<ClipScorer>> {
        SHARED
            .get_or_init(|| match ClipScorer::load(model_dir) {
                Ok(scorer) => Some(Arc::new(scorer)),
                Err(e) => {
                    tracing::warn!("scene model failed to load: {e}");
                    None
                }
            })
            .clone()
            .ok_or_else(|| StageFailure::ServiceUnavailable("scene model unavailable".into()))
    }

    /// CLIP-style image/text similarity scorer over ONNX Runtime.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the model directory.
    /// `Session::run` needs `&mut self`, hence the interior `Mutex`.
    pub struct ClipScorer {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl ClipScorer {
        pub fn load(model_dir: &Path) -> StageResult<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            for required in [&model_path, &tokenizer_path] {
                if !required.exists() {
                    return Err(StageFailure::ServiceUnavailable(format!(
                        "missing model file: {}",
                        required.display()
                    )));
                }
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| StageFailure::ServiceUnavailable(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| StageFailure::ServiceUnavailable(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| {
                    StageFailure::ServiceUnavailable(format!("ONNX load failed: {e}"))
                })?;
            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
                StageFailure::ServiceUnavailable(format!("tokenizer load failed: {e}"))
            })?;

            tracing::info!("scene model loaded from {}", model_dir.display());
            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        /// One similarity score per prompt, in prompt order.
        pub fn score(&self, image: &DynamicImage, prompts: &[&str]) -> StageResult<Vec<f32>> {
            use ort::value::TensorRef;

            let (ids_array, mask_array) = self.tokenize(prompts)?;
            let pixel_array = preprocess(image);

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;
            let pixel_tensor = TensorRef::from_array_view(&pixel_array)
                .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| StageFailure::ServiceUnavailable("session lock poisoned".into()))?;
            let outputs = session
                .run(ort::inputs![ids_tensor, pixel_tensor, mask_tensor])
                .map_err(|e| {
                    StageFailure::ServiceUnavailable(format!("ONNX inference failed: {e}"))
                })?;

            // logits_per_image: [1, prompt_count]
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;
            if shape.len() != 2 || shape[1] as usize != prompts.len() {
                return Err(StageFailure::ServiceUnavailable(format!(
                    "unexpected logits shape {shape:?} for {} prompts",
                    prompts.len()
                )));
            }
            Ok(data.to_vec())
        }

        /// Tokenizes the prompt batch, padded to a shared sequence length.
        fn tokenize(
            &self,
            prompts: &[&str],
        ) -> StageResult<(ndarray::Array2<i64>, ndarray::Array2<i64>)> {
            let mut encodings = Vec::with_capacity(prompts.len());
            for prompt in prompts {
                let encoding = self
                    .tokenizer
                    .encode(*prompt, true)
                    .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;
                encodings.push(encoding);
            }
            let seq_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0);

            let mut ids = ndarray::Array2::<i64>::zeros((prompts.len(), seq_len));
            let mut mask = ndarray::Array2::<i64>::zeros((prompts.len(), seq_len));
            for (row, encoding) in encodings.iter().enumerate() {
                for (col, &id) in encoding.get_ids().iter().enumerate() {
                    ids[[row, col]] = i64::from(id);
                }
                for (col, &m) in encoding.get_attention_mask().iter().enumerate() {
                    mask[[row, col]] = i64::from(m);
                }
            }
            Ok((ids, mask))
        }
    }

    /// Resizes to the model resolution and normalizes channel-first.
    fn preprocess(image: &DynamicImage) -> ndarray::Array4<f32> {
        let resized = image
            .resize_exact(IMAGE_SIZE, IMAGE_SIZE, image::imageops::FilterType::Triangle)
            .to_rgb8();
        let mut pixels =
            ndarray::Array4::<f32>::zeros((1, 3, IMAGE_SIZE as usize, IMAGE_SIZE as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                let value = f32::from(pixel[channel]) / 255.0;
                pixels[[0, channel, y as usize, x as usize]] =
                    (value - MEAN[channel]) / STD[channel];
            }
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_closed_at_31_unique_entries() {
        let mut sorted = SCENE_PROMPTS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 31);
    }

    #[test]
    fn highest_score_wins() {
        let scores = [0.1, 0.7, 0.3];
        assert_eq!(best_prompt_index(&scores), Some(1));
    }

    #[test]
    fn ties_resolve_to_the_lowest_index() {
        let scores = [0.2, 0.9, 0.9, 0.1];
        assert_eq!(best_prompt_index(&scores), Some(1));

        let all_equal = [0.5; 31];
        assert_eq!(best_prompt_index(&all_equal), Some(0));
    }

    #[test]
    fn empty_scores_select_nothing() {
        assert_eq!(best_prompt_index(&[]), None);
    }

    #[test]
    fn nan_scores_never_win() {
        let scores = [f32::NAN, 0.2, 0.9, f32::NAN, 0.9];
        assert_eq!(best_prompt_index(&scores), Some(2));

        assert_eq!(best_prompt_index(&[f32::NAN, f32::NAN]), None);
    }

    #[cfg(not(feature = "onnx-scene"))]
    #[test]
    fn classifier_degrades_without_a_model() {
        use crate::error::StageFailure;

        let classifier = SceneClassifier::new(None);
        let result = classifier.classify(Path::new("whatever.jpg"));
        assert!(matches!(
            result,
            Err(StageFailure::ServiceUnavailable(_))
        ));
    }
}

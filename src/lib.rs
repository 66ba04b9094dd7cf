use image::GrayImage;
use log::{debug, error, info};

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use candidate::Position;
use error::{LprErrorKind, LprResult};
use loader::{DecodePolicy, LabeledImage};
use matcher::MatchMethod;
use preprocess::PreprocessConfig;
use report::{RecognitionResult, ScoredCandidate, Summary, TOP_K};

pub mod candidate;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod preprocess;
pub mod report;


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognizerOptions {
    pub preprocess: PreprocessConfig,
    pub method: MatchMethod,
    pub top_k: usize,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self { preprocess: PreprocessConfig::default(), method: MatchMethod::default(), top_k: TOP_K }
    }
}

/// Template matcher holding the preprocessed template set.
pub struct Recognizer {
    templates: Vec<LabeledImage>,
    options: RecognizerOptions,
}

impl Recognizer {

    /// Preprocess `templates` once, they are reused for every test image.
    pub fn new(templates: Vec<LabeledImage>, options: RecognizerOptions) -> LprResult<Self> {
        options.preprocess.validate()?;
        let templates = templates.iter()
            .map(|template| template.with_image(preprocess::preprocess(&template.image, &options.preprocess)))
            .collect();
        Ok(Recognizer { templates, options })
    }

    /// Load every template image under `dir`, the directory names being the labels.
    pub fn from_dir(dir: impl AsRef<Path>, options: RecognizerOptions, policy: DecodePolicy) -> LprResult<Self> {
        let dir = dir.as_ref();
        let templates = loader::read_directory(dir, policy)?;
        if templates.is_empty() {
            return Err(LprErrorKind::NoTemplates(dir.to_path_buf()).into());
        }
        info!("loaded {} templates from {:?}", templates.len(), dir);
        Self::new(templates, options)
    }

    /// The preprocessed templates, in load order.
    pub fn templates(&self) -> &[LabeledImage] {
        &self.templates
    }

    pub fn options(&self) -> &RecognizerOptions {
        &self.options
    }

    /// Recognize one test image, reading its plate position from the file name.
    pub fn recognize(&self, test: &LabeledImage) -> LprResult<RecognitionResult> {
        let position = Position::from_filename(&test.filename)?;
        self.recognize_at(test, position)
    }

    /// Recognize one test image whose plate position is already known.
    pub fn recognize_at(&self, test: &LabeledImage, position: Position) -> LprResult<RecognitionResult> {
        let processed = preprocess::preprocess(&test.image, &self.options.preprocess);
        let candidates = self.score_candidates(&processed, position)?;
        debug!("{}/{}: {} candidates at position {}", test.category, test.filename, candidates.len(), position);
        Ok(RecognitionResult {
            category: test.category.clone(),
            filename: test.filename.clone(),
            candidates: report::rank(candidates, self.options.top_k),
        })
    }

    fn score_candidates(&self, processed: &GrayImage, position: Position) -> LprResult<Vec<ScoredCandidate>> {
        candidate::filter_candidates(&self.templates, position)
            .map(|template| -> LprResult<ScoredCandidate> {
                let resized = matcher::resize_to_template(processed, &template.image);
                let score = matcher::score(&resized, &template.image, self.options.method)?;
                Ok(ScoredCandidate {
                    category: template.category.clone(),
                    filename: template.filename.clone(),
                    score,
                })
            })
            .collect()
    }
}

/// Recognize every image under `test_dir` and write the report into `out`.
///
/// Test images are loaded one at a time. One that can not be recognized gets an
/// error line in its report block and the run goes on; the summary counts it.
pub fn run<W: Write>(recognizer: &Recognizer, test_dir: impl AsRef<Path>, policy: DecodePolicy, out: &mut W) -> LprResult<Summary> {
    let mut summary = Summary::default();
    for path in loader::list_files(test_dir)? {
        let test = match loader::load_with_policy(&path, policy)? {
            Some(test) => test,
            None => {
                summary.record_skip();
                continue;
            }
        };

        let before_time = Instant::now();
        let res = recognizer.recognize(&test);
        let elapsed = before_time.elapsed();
        debug!("{}/{} took {}ms", test.category, test.filename, elapsed.as_millis());
        match res {
            Ok(result) => {
                write!(out, "{}", result)?;
                summary.record(&result, elapsed);
            }
            Err(e) => {
                error!("{}/{}: {}", test.category, test.filename, e);
                writeln!(out, "Test Image: {}/{}", test.category, test.filename)?;
                writeln!(out, "  Error: {}", e)?;
                writeln!(out)?;
                summary.record_failure(elapsed);
            }
        }
    }
    Ok(summary)
}

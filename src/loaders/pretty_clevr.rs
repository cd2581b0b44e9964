//! Pretty-CLEVR dataset loader.
//!
//! Handles the on-disk dataset layout produced by the generator:
//! - per split `dict.json`, `questions.csv`, `images/*.png`, `states/*.json`
//! - one-time download and extraction of the prepackaged archive
//! - fixed-shape sample iteration with train-time augmentation

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::GenericImageView;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::render::IMAGE_SIZE;
use crate::scene::{Scene, Vocabulary};

/// Where the prepackaged archive lives.
pub const DATASET_URL: &str = "https://www.dropbox.com/s/3jaeq1ugcfs4jf3/pretty-clevr.tgz?dl=1";

/// Maximum objects per scene; sample arrays are padded to this length.
pub const MAX_OBJECTS: usize = 8;

/// Fixed per-sample image shape (height, width, channels).
pub const IMAGE_SHAPE: (usize, usize, usize) = (IMAGE_SIZE as usize, IMAGE_SIZE as usize, 3);

/// Fixed per-sample position shape.
pub const POSITIONS_SHAPE: (usize, usize) = (MAX_OBJECTS, 2);

/// Violations of the dataset layout.
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("unknown symbol '{symbol}' in {file}")]
    UnknownSymbol { file: String, symbol: String },
    #[error("malformed question row in {file}: '{row}'")]
    MalformedQuestion { file: String, row: String },
    #[error("missing split directory: {}", .0.display())]
    MissingSplit(PathBuf),
    #[error("image {file} is {width}x{height}, expected {expected}x{expected}")]
    BadImageShape {
        file: String,
        width: u32,
        height: u32,
        expected: u32,
    },
    #[error("scene {file} has {count} objects, more than the supported {max}")]
    TooManyObjects {
        file: String,
        count: usize,
        max: usize,
    },
    #[error("{file} references missing {kind} file '{name}'")]
    DanglingReference {
        file: String,
        kind: &'static str,
        name: String,
    },
}

/// One parsed `questions.csv` row. Symbols are kept verbatim alongside their
/// vocabulary indices, which are resolved (and validated) at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub image: String,
    pub state: String,
    pub anchor: String,
    pub hops: usize,
    pub target: String,
    pub anchor_index: usize,
    pub target_index: usize,
}

impl QuestionRecord {
    /// Parse a `png, json, anchor, hops, target` row.
    fn parse(row: &str, vocab: &Vocabulary, file: &str) -> Result<Self, DatasetError> {
        let malformed = || DatasetError::MalformedQuestion {
            file: file.to_string(),
            row: row.to_string(),
        };

        let fields: Vec<&str> = row.split(", ").collect();
        let [image, state, anchor, hops, target]: [&str; 5] =
            fields.try_into().map_err(|_| malformed())?;
        let hops = hops.parse::<usize>().map_err(|_| malformed())?;

        let index_of = |symbol: &str| {
            vocab
                .index_of(symbol)
                .ok_or_else(|| DatasetError::UnknownSymbol {
                    file: file.to_string(),
                    symbol: symbol.to_string(),
                })
        };

        Ok(Self {
            image: image.to_string(),
            state: state.to_string(),
            anchor: anchor.to_string(),
            hops,
            target: target.to_string(),
            anchor_index: index_of(anchor)?,
            target_index: index_of(target)?,
        })
    }
}

/// A scene's state converted to fixed-shape arrays, zero-padded past `len`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneArrays {
    pub positions: [[f32; 2]; MAX_OBJECTS],
    pub colors: [usize; MAX_OBJECTS],
    pub markers: [usize; MAX_OBJECTS],
    pub len: usize,
}

impl SceneArrays {
    fn from_scene(scene: &Scene, vocab: &Vocabulary, file: &str) -> Result<Self, DatasetError> {
        if scene.len() > MAX_OBJECTS {
            return Err(DatasetError::TooManyObjects {
                file: file.to_string(),
                count: scene.len(),
                max: MAX_OBJECTS,
            });
        }

        let mut arrays = Self {
            positions: [[0.0; 2]; MAX_OBJECTS],
            colors: [0; MAX_OBJECTS],
            markers: [0; MAX_OBJECTS],
            len: scene.len(),
        };

        for (i, obj) in scene.objects.iter().enumerate() {
            let index_of = |symbol: &str| {
                vocab
                    .index_of(symbol)
                    .ok_or_else(|| DatasetError::UnknownSymbol {
                        file: file.to_string(),
                        symbol: symbol.to_string(),
                    })
            };
            arrays.positions[i] = [obj.p[0] as f32, obj.p[1] as f32];
            arrays.colors[i] = index_of(&obj.c)?;
            arrays.markers[i] = index_of(&obj.m)?;
        }

        Ok(arrays)
    }
}

/// One loaded split: every question, decoded image and scene state.
pub struct Split {
    pub questions: Vec<QuestionRecord>,
    pub images: HashMap<String, Vec<u8>>,
    pub states: HashMap<String, SceneArrays>,
}

impl Split {
    /// Load a split directory, validating every cross-reference.
    pub fn load(split_dir: &Path, vocab: &Vocabulary) -> Result<Self> {
        if !split_dir.is_dir() {
            return Err(DatasetError::MissingSplit(split_dir.to_path_buf()).into());
        }
        info!("Loading {}...", split_dir.display());

        let questions_path = split_dir.join("questions.csv");
        let questions_file = questions_path.to_string_lossy().to_string();
        let csv = fs::read_to_string(&questions_path)
            .with_context(|| format!("Failed to read {}", questions_path.display()))?;
        let questions = csv
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| QuestionRecord::parse(l.trim(), vocab, &questions_file))
            .collect::<Result<Vec<_>, _>>()?;

        let images = Self::load_images(&split_dir.join("images"))?;
        let states = Self::load_states(&split_dir.join("states"), vocab)?;

        for q in &questions {
            if !images.contains_key(&q.image) {
                return Err(DatasetError::DanglingReference {
                    file: questions_file.clone(),
                    kind: "image",
                    name: q.image.clone(),
                }
                .into());
            }
            if !states.contains_key(&q.state) {
                return Err(DatasetError::DanglingReference {
                    file: questions_file.clone(),
                    kind: "state",
                    name: q.state.clone(),
                }
                .into());
            }
        }

        info!(
            "  {} questions, {} images, {} states",
            questions.len(),
            images.len(),
            states.len()
        );

        Ok(Self {
            questions,
            images,
            states,
        })
    }

    fn load_images(images_dir: &Path) -> Result<HashMap<String, Vec<u8>>> {
        let mut images = HashMap::new();
        let entries = fs::read_dir(images_dir)
            .with_context(|| format!("Failed to read image directory: {}", images_dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let name = file_name(&path);
            let img = image::open(&path)
                .with_context(|| format!("Failed to decode image: {}", path.display()))?;
            let (width, height) = img.dimensions();
            if width != IMAGE_SIZE || height != IMAGE_SIZE {
                return Err(DatasetError::BadImageShape {
                    file: name,
                    width,
                    height,
                    expected: IMAGE_SIZE,
                }
                .into());
            }
            images.insert(name, img.to_rgb8().into_raw());
        }
        Ok(images)
    }

    fn load_states(states_dir: &Path, vocab: &Vocabulary) -> Result<HashMap<String, SceneArrays>> {
        let mut states = HashMap::new();
        let entries = fs::read_dir(states_dir)
            .with_context(|| format!("Failed to read state directory: {}", states_dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = file_name(&path);
            let file = fs::File::open(&path)
                .with_context(|| format!("Failed to open state file: {}", path.display()))?;
            let scene: Scene = serde_json::from_reader(file)
                .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
            states.insert(name.clone(), SceneArrays::from_scene(&scene, vocab, &name)?);
        }
        Ok(states)
    }

    /// Iterate samples: `epochs` of `None` repeats forever, reshuffling each
    /// pass; `augment` applies a random scale and rotation to positions.
    pub fn samples(&self, epochs: Option<usize>, augment: bool, rng: StdRng) -> SampleIter<'_> {
        SampleIter::new(self, epochs, augment, rng)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// One model-ready sample with fixed shapes (see [`IMAGE_SHAPE`] and
/// [`POSITIONS_SHAPE`]); array entries past `n_objects` are zero.
#[derive(Debug, Clone)]
pub struct Sample {
    pub image: Vec<u8>,
    pub positions: [[f32; 2]; MAX_OBJECTS],
    pub colors: [usize; MAX_OBJECTS],
    pub markers: [usize; MAX_OBJECTS],
    pub anchor: usize,
    pub hops: usize,
    pub target: usize,
    pub n_objects: usize,
}

/// Shuffled question iterator over one split.
pub struct SampleIter<'a> {
    split: &'a Split,
    order: Vec<usize>,
    cursor: usize,
    epochs_left: Option<usize>,
    augment: bool,
    rng: StdRng,
}

impl<'a> SampleIter<'a> {
    fn new(split: &'a Split, epochs: Option<usize>, augment: bool, mut rng: StdRng) -> Self {
        let mut order: Vec<usize> = (0..split.questions.len()).collect();
        order.shuffle(&mut rng);
        Self {
            split,
            order,
            cursor: 0,
            epochs_left: epochs,
            augment,
            rng,
        }
    }

    fn augmented_positions(&mut self, positions: [[f32; 2]; MAX_OBJECTS]) -> [[f32; 2]; MAX_OBJECTS] {
        // Random zoom in [0.5, 2] and rotation, matching the row-vector
        // convention p' = p * [[cos, sin], [-sin, cos]].
        let scale = 2f32.powf(2.0 * self.rng.gen::<f32>() - 1.0);
        let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();

        let mut out = positions;
        for p in out.iter_mut() {
            let x = p[0] * scale;
            let y = p[1] * scale;
            p[0] = x * cos - y * sin;
            p[1] = x * sin + y * cos;
        }
        out
    }
}

impl<'a> Iterator for SampleIter<'a> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.order.is_empty() {
            return None;
        }
        if self.cursor == self.order.len() {
            if let Some(left) = &mut self.epochs_left {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    return None;
                }
            }
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        if self.epochs_left == Some(0) {
            return None;
        }

        let q = &self.split.questions[self.order[self.cursor]];
        self.cursor += 1;

        let image = self.split.images.get(&q.image)?.clone();
        let state = self.split.states.get(&q.state)?;
        let positions = if self.augment {
            self.augmented_positions(state.positions)
        } else {
            state.positions
        };

        Some(Sample {
            image,
            positions,
            colors: state.colors,
            markers: state.markers,
            anchor: q.anchor_index,
            hops: q.hops,
            target: q.target_index,
            n_objects: state.len,
        })
    }
}

/// The full dataset: vocabulary plus the three conventional splits.
pub struct PrettyClevr {
    pub vocab: Vocabulary,
    pub train: Split,
    pub dev: Split,
    pub test: Split,
}

impl PrettyClevr {
    /// Open the dataset under `$DATA_DIR` (or `/tmp`), downloading and
    /// extracting the prepackaged archive first if the cache is missing.
    pub fn open() -> Result<Self> {
        let base = base_dir();
        let data_dir = ensure_dataset(&base)?;
        Self::from_dir(&data_dir)
    }

    /// Load an already materialized dataset directory.
    pub fn from_dir(data_dir: &Path) -> Result<Self> {
        let vocab = Vocabulary::load(&data_dir.join("train").join("dict.json"))?;
        let train = Split::load(&data_dir.join("train"), &vocab)?;
        let dev = Split::load(&data_dir.join("dev"), &vocab)?;
        let test = Split::load(&data_dir.join("test"), &vocab)?;
        Ok(Self {
            vocab,
            train,
            dev,
            test,
        })
    }

    /// Endless augmented training samples.
    pub fn train_samples(&self) -> SampleIter<'_> {
        self.train.samples(None, true, StdRng::from_entropy())
    }

    /// Endless augmented dev samples.
    pub fn dev_samples(&self) -> SampleIter<'_> {
        self.dev.samples(None, true, StdRng::from_entropy())
    }

    /// One unaugmented pass over the test split.
    pub fn test_samples(&self) -> SampleIter<'_> {
        self.test.samples(Some(1), false, StdRng::from_entropy())
    }
}

fn base_dir() -> PathBuf {
    env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Return the dataset directory under `base_dir`, fetching and extracting
/// the archive if it is not there yet. Download failures and malformed
/// archives propagate; there is no retry.
pub fn ensure_dataset(base_dir: &Path) -> Result<PathBuf> {
    let data_dir = base_dir.join("pretty-clevr");
    if data_dir.exists() {
        return Ok(data_dir);
    }

    fs::create_dir_all(base_dir)
        .with_context(|| format!("Failed to create base directory: {}", base_dir.display()))?;

    let tgz_path = base_dir.join("pretty-clevr.tgz");
    info!("Downloading {} to {}", DATASET_URL, tgz_path.display());
    let mut response = reqwest::blocking::get(DATASET_URL)
        .with_context(|| format!("Failed to fetch dataset archive from {}", DATASET_URL))?;
    if !response.status().is_success() {
        bail!("Dataset download failed with HTTP status {}", response.status());
    }
    let mut tgz = fs::File::create(&tgz_path)
        .with_context(|| format!("Failed to create {}", tgz_path.display()))?;
    response
        .copy_to(&mut tgz)
        .context("Failed to write dataset archive")?;

    info!("Extracting {}...", tgz_path.display());
    let tar_gz = fs::File::open(&tgz_path)?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(tar_gz));
    archive
        .unpack(base_dir)
        .with_context(|| format!("Failed to extract {}", tgz_path.display()))?;

    if !data_dir.exists() {
        bail!(
            "Archive did not produce the expected directory: {}",
            data_dir.display()
        );
    }
    Ok(data_dir)
}

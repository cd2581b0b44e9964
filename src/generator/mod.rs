//! Dataset generation: scenes, renders, states and question files per split.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::render::save_scene_png;
use crate::scene::{synthesize_questions, vocabulary, Scene};

/// Generation parameters, loaded from a YAML file.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Directory the split directories are created under.
    pub output_dir: PathBuf,
    pub objects_per_scene: usize,
    /// Minimum squared distance between any two objects.
    pub min_separation_sq: f64,
    /// Fixed RNG seed for reproducible datasets.
    pub seed: Option<u64>,
    pub splits: Vec<SplitConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SplitConfig {
    pub name: String,
    pub scenes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("pretty-clevr"),
            objects_per_scene: 8,
            min_separation_sq: 0.1,
            seed: None,
            splits: vec![
                SplitConfig {
                    name: "train".to_string(),
                    scenes: 100_000,
                },
                SplitConfig {
                    name: "dev".to_string(),
                    scenes: 1_000,
                },
                SplitConfig {
                    name: "test".to_string(),
                    scenes: 1_000,
                },
            ],
        }
    }
}

pub fn load_config(path: &Path) -> Result<GenerationConfig> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: GenerationConfig =
        serde_yaml::from_str(&config_str).with_context(|| "Failed to parse YAML config")?;

    Ok(config)
}

/// Writes complete dataset splits: per split a `dict.json`, a
/// `questions.csv`, and paired `images/*.png` / `states/*.json` files.
pub struct DatasetGenerator {
    config: GenerationConfig,
    rng: StdRng,
}

impl DatasetGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        if config.objects_per_scene == 0 {
            bail!("objects_per_scene must be at least 1");
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    /// Generate every configured split.
    pub fn run(&mut self) -> Result<()> {
        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.config.output_dir.display()
            )
        })?;

        for i in 0..self.config.splits.len() {
            let name = self.config.splits[i].name.clone();
            let scenes = self.config.splits[i].scenes;
            let split_dir = self.config.output_dir.join(&name);
            self.generate_split(&split_dir, scenes)
                .with_context(|| format!("Failed to generate split '{}'", name))?;
        }

        Ok(())
    }

    /// Generate one split into `split_dir`. The directory must not exist yet;
    /// a half-written split from an earlier run has to be removed explicitly.
    pub fn generate_split(&mut self, split_dir: &Path, scenes: usize) -> Result<()> {
        info!(
            "Generating {} scenes of {} objects into {}",
            scenes,
            self.config.objects_per_scene,
            split_dir.display()
        );

        fs::create_dir(split_dir).with_context(|| {
            format!(
                "Failed to create split directory (already present?): {}",
                split_dir.display()
            )
        })?;
        fs::create_dir(split_dir.join("images"))?;
        fs::create_dir(split_dir.join("states"))?;

        vocabulary().save(&split_dir.join("dict.json"))?;

        let questions_file = fs::File::create(split_dir.join("questions.csv"))
            .with_context(|| "Failed to create questions.csv")?;
        let mut questions = BufWriter::new(questions_file);

        #[cfg(feature = "progress-bar")]
        let progress = indicatif::ProgressBar::new(scenes as u64);

        for i in 0..scenes {
            let scene = Scene::sample(
                &mut self.rng,
                self.config.objects_per_scene,
                self.config.min_separation_sq,
            )?;

            let png_name = format!("{:05}.png", i);
            let json_name = format!("{:05}.json", i);

            save_scene_png(&scene, &split_dir.join("images").join(&png_name))?;

            let state_file = fs::File::create(split_dir.join("states").join(&json_name))
                .with_context(|| format!("Failed to create state file {}", json_name))?;
            serde_json::to_writer(state_file, &scene)
                .with_context(|| format!("Failed to write state file {}", json_name))?;

            for q in synthesize_questions(&scene) {
                writeln!(
                    questions,
                    "{}, {}, {}, {}, {}",
                    png_name, json_name, q.anchor, q.hops, q.target
                )?;
            }

            #[cfg(feature = "progress-bar")]
            progress.inc(1);
        }

        #[cfg(feature = "progress-bar")]
        progress.finish();

        questions.flush()?;
        info!("Finished split {}", split_dir.display());
        Ok(())
    }
}

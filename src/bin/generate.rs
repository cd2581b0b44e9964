//! Generate Pretty-CLEVR dataset splits.
//!
//! Usage: cargo run --release --bin generate -- --config config/dataset.yaml

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use pretty_clevr::{load_config, DatasetGenerator, GenerationConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate the Pretty-CLEVR dataset")]
struct Args {
    /// Path to a generation configuration YAML file; defaults match the
    /// published dataset (train/dev/test, 8 objects per scene)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override objects per scene
    #[arg(long)]
    objects: Option<usize>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    pretty_clevr::logging::init_logger();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GenerationConfig::default(),
    };

    // Override config with command line args if provided
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(objects) = args.objects {
        config.objects_per_scene = objects;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    println!("\n=== Pretty-CLEVR generator ===\n");
    println!("Output: {}", config.output_dir.display());
    println!("Objects per scene: {}", config.objects_per_scene);
    for split in &config.splits {
        println!("  {}: {} scenes", split.name, split.scenes);
    }

    let mut generator = DatasetGenerator::new(config)?;
    generator.run()?;

    println!("\n=== Generation complete ===\n");
    Ok(())
}

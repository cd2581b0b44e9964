//! Print summary statistics for a generated or downloaded dataset split.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use pretty_clevr::loaders::Split;
use pretty_clevr::scene::Vocabulary;

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize a Pretty-CLEVR split")]
struct Args {
    /// Dataset root directory (contains train/dev/test)
    data_dir: PathBuf,

    /// Split to summarize
    #[arg(long, default_value = "train")]
    split: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    pretty_clevr::logging::init_logger();

    let vocab = Vocabulary::load(&args.data_dir.join("train").join("dict.json"))?;
    let split = Split::load(&args.data_dir.join(&args.split), &vocab)?;

    println!("Split '{}':", args.split);
    println!("  scenes:    {}", split.states.len());
    println!("  images:    {}", split.images.len());
    println!("  questions: {}", split.questions.len());

    let mut by_hops: BTreeMap<usize, usize> = BTreeMap::new();
    let mut by_anchor: BTreeMap<&str, usize> = BTreeMap::new();
    for q in &split.questions {
        *by_hops.entry(q.hops).or_insert(0) += 1;
        *by_anchor.entry(q.anchor.as_str()).or_insert(0) += 1;
    }

    println!("  questions by hop count:");
    for (hops, count) in &by_hops {
        println!("    {} hops: {}", hops, count);
    }
    println!("  questions by anchor symbol:");
    for (anchor, count) in &by_anchor {
        println!("    {}: {}", anchor, count);
    }

    Ok(())
}

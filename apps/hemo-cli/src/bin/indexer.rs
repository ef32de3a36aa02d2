use std::env;
use std::path::PathBuf;

use anyhow::bail;
use hemo_core::config::{resolve_with_base, Config};
use hemo_core::data_processor::{ChunkingConfig, DataProcessor};
use hemo_core::logging::init_logging;
use hemo_core::types::Passage;
use hemo_embed::embedder_from_settings;
use hemo_vector::{build_index, save_prebuilt, ArtifactPaths, DEFAULT_BATCH_SIZE};

const USAGE: &str = "Usage: hemo-indexer [data_dir] [--out <dir>] [--limit <files>] [--batch-size <n>]";

fn flag_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> anyhow::Result<T> {
    match args.get(i + 1).map(|v| v.parse::<T>()) {
        Some(Ok(v)) => Ok(v),
        _ => bail!("{flag} requires a value\n{USAGE}"),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging("info");
    let config = Config::load()?;
    let settings = config.settings()?;
    let base = PathBuf::from(".");

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None;
    let mut out_dir = None;
    let mut limit = None;
    let mut batch_size = DEFAULT_BATCH_SIZE;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" | "-o" => {
                out_dir = Some(flag_value::<PathBuf>(&args, i, "--out")?);
                i += 1;
            }
            "--limit" => {
                limit = Some(flag_value::<usize>(&args, i, "--limit")?);
                i += 1;
            }
            "--batch-size" => {
                batch_size = flag_value::<usize>(&args, i, "--batch-size")?;
                i += 1;
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            a if !a.starts_with('-') => data_dir = Some(PathBuf::from(a)),
            other => bail!("unknown flag {other}\n{USAGE}"),
        }
        i += 1;
    }

    let data_dir = data_dir.unwrap_or_else(|| resolve_with_base(&base, &settings.data.raw_txt_dir));
    let out_dir = match out_dir {
        Some(dir) => dir,
        None => resolve_with_base(&base, settings.artifacts.dir.as_deref().unwrap_or("attached_assets")),
    };
    tracing::info!(data = %data_dir.display(), out = %out_dir.display(), "building pre-built index");

    let processor = DataProcessor::with_config(ChunkingConfig::from(&settings.data));
    let chunks = match limit {
        Some(n) => processor.process_directory_limited(&data_dir, n)?,
        None => processor.process_directory(&data_dir)?,
    };
    if chunks.is_empty() {
        bail!("no .txt content found under {}", data_dir.display());
    }
    let passages: Vec<Passage> = chunks.iter().map(|c| c.to_passage()).collect();

    let embedder = embedder_from_settings(&settings.embedding)?;
    let index = build_index(embedder.as_ref(), &passages, batch_size, true)?;
    let paths = ArtifactPaths::from_settings(&out_dir, &settings.artifacts);
    let manifest = save_prebuilt(&paths, &index, embedder.embedder_id())?;

    println!(
        "Indexed {} chunks (d{}, {}) into {}",
        manifest.count,
        manifest.dimension,
        manifest.embedder_id,
        out_dir.display()
    );
    Ok(())
}

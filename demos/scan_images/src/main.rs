// Scan images — build a dataset from a config file and stream it in batches
//
// Usage:
//   cargo run -p scan-images-demo -- dataset.yaml
//   cargo run -p scan-images-demo -- dataset.yaml --batch-size 64 --workers 4
//   RUST_LOG=debug cargo run -p scan-images-demo -- labels.json --resize 224
//
// dataset.yaml:
//   kind: images
//   root: [data/set_a, data/set_b]
//   path_preserved: data/set_b
//   frac: 0.1

use std::path::PathBuf;

use clap::Parser;
use marten::bail;
use marten::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "scan_images",
    about = "Enumerate an image dataset and decode every sample in batches"
)]
struct Args {
    /// Dataset config (.yaml, .yml or .json).
    config: PathBuf,
    /// Samples per batch.
    #[arg(long, default_value_t = 32)]
    batch_size: usize,
    /// Fetch samples in parallel when non-zero.
    #[arg(long, default_value_t = 0)]
    workers: usize,
    /// Resize every image to SIZE x SIZE before conversion.
    #[arg(long, default_value_t = 224)]
    resize: u32,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let loader_config = DataLoaderConfig::default()
        .batch_size(args.batch_size)
        .num_workers(args.workers);
    let transform = Resize::new(args.resize, args.resize)
        .then(ToSample)
        .then(Normalize::imagenet());

    match load_config::<DatasetConfig>(&args.config)? {
        DatasetConfig::Images(cfg) => {
            let ds = ImageDataset::from_config(&cfg)?;
            if ds.is_empty() {
                bail!("no images found for {}", args.config.display());
            }
            tracing::info!(
                images = ds.len(),
                held_out = ds.preserved().len(),
                "dataset ready"
            );
            let ds = ds.with_transform(transform);
            run(&ds, loader_config)
        }
        DatasetConfig::Labelled(cfg) => {
            let ds = LabelledDataset::from_config(&cfg)?;
            if ds.is_empty() {
                bail!("no labelled images found for {}", args.config.display());
            }
            tracing::info!(
                images = ds.len(),
                classes = ds.num_classes(),
                "dataset ready"
            );
            let ds = ds.with_transform(transform);
            run(&ds, loader_config)
        }
    }
}

fn run<D>(ds: &D, config: DataLoaderConfig) -> Result<()>
where
    D: Dataset,
    D::Item: Send,
{
    let mut loader = DataLoader::new(ds, config);
    let total = loader.num_batches();
    let mut samples = 0usize;
    let mut failed = 0usize;
    for (i, batch) in loader.iter().enumerate() {
        match batch {
            Ok(batch) => samples += batch.len(),
            Err(e) => {
                failed += 1;
                tracing::warn!(batch = i, error = %e, "batch failed");
            }
        }
    }
    tracing::info!(batches = total, samples, failed, "done");
    Ok(())
}

//! Sample command
//!
//! Builds a `StreamConfig` from an optional TOML file plus command-line
//! overrides, then prints the samples a training loop would see.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use labelpack_storage::{Sample, SampleStream, StreamConfig};

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Container path
    pub file: PathBuf,

    /// Number of samples to print
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Group samples into batches of this size
    #[arg(short, long)]
    pub batch: Option<usize>,

    /// TOML stream config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of folds for cross validation
    #[arg(long, requires = "fold")]
    pub kfold: Option<u32>,

    /// Fold held out for evaluation
    #[arg(long, requires = "kfold")]
    pub fold: Option<u32>,

    /// Stream the held-out fold instead of the training folds
    #[arg(long, requires = "kfold")]
    pub eval: bool,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep file order inside each group
    #[arg(long)]
    pub no_shuffle: bool,

    /// Put every record in one group
    #[arg(long)]
    pub no_stratify: bool,
}

impl SampleArgs {
    /// Config file (or defaults) with command-line overrides applied
    pub fn stream_config(&self) -> Result<StreamConfig> {
        let mut config = match &self.config {
            Some(path) => StreamConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => StreamConfig::default(),
        };

        if let (Some(k), Some(fold)) = (self.kfold, self.fold) {
            config.kfold(k, fold, !self.eval)?;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.no_shuffle {
            config.shuffle = false;
        }
        if self.no_stratify {
            config.stratify = false;
        }

        Ok(config)
    }
}

fn print_sample(sample: &Sample) {
    let sizes: Vec<String> = sample.fields.iter().map(|f| f.len().to_string()).collect();
    println!("{:>10}  [{}]", sample.label, sizes.join(", "));
}

/// Handle `packctl sample`
pub fn handle_sample(args: SampleArgs) -> Result<()> {
    let config = args.stream_config()?;
    let mut stream = SampleStream::open(&args.file, &config)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let mut printed = 0usize;
    match args.batch {
        Some(batch_size) => {
            let mut batches = 0usize;
            while printed < args.count {
                let Some(batch) = stream.next_batch(batch_size)? else {
                    break;
                };
                batches += 1;
                println!(
                    "batch {}: {} samples, {} padding",
                    batches,
                    batch.len(),
                    batch.padding
                );
                for sample in &batch.samples {
                    print_sample(sample);
                }
                printed += batch.len();
            }
        }
        None => {
            while printed < args.count {
                let Some(sample) = stream.next_sample()? else {
                    break;
                };
                print_sample(&sample);
                printed += 1;
            }
        }
    }

    let sampler = stream.sampler();
    println!(
        "{} samples printed, {} usable out of {} records in {} groups",
        printed,
        sampler.size(),
        sampler.total(),
        sampler.group_count()
    );

    Ok(())
}

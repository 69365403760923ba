//! Command-line front end.
//!
//! Usage:
//!   ferrite-gan train faces/ model.json --steps 2000 --seed 42
//!   ferrite-gan generate photo.jpg model.json out.png
//!   ferrite-gan sample model.json out.png --seed 7

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ferrite_gan::data::DEFAULT_OUTPUT_SIZE;
use ferrite_gan::{generate_file, sample_file, train, PipelineConfig};

/// Train a GAN on a folder of images and generate from the saved generator
#[derive(Parser)]
#[command(name = "ferrite-gan", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train on every .jpg/.jpeg/.png under DATASET and save the generator
    Train {
        dataset: PathBuf,
        model: PathBuf,

        /// JSON run configuration (architecture + training)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        steps: Option<usize>,

        #[arg(long)]
        batch_size: Option<usize>,

        /// Defaults to the current time; the value used is logged
        #[arg(long)]
        seed: Option<u64>,

        /// Print losses every N steps
        #[arg(long)]
        log_every: Option<usize>,
    },
    /// Run a trained image-to-image generator on INPUT
    Generate {
        input: PathBuf,
        model: PathBuf,
        output: PathBuf,

        /// Edge length of the square output image
        #[arg(long, default_value_t = DEFAULT_OUTPUT_SIZE)]
        size: u32,
    },
    /// Draw one image from a latent-input generator
    Sample {
        model: PathBuf,
        output: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = DEFAULT_OUTPUT_SIZE)]
        size: u32,
    },
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command {
        Command::Train { dataset, model, config, steps, batch_size, seed, log_every } => {
            let mut pipeline = match &config {
                Some(path) => PipelineConfig::load_json(path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            let training = &mut pipeline.training;
            // Flag first, then a config file's seed, then the clock.
            training.seed = match (seed, &config) {
                (Some(seed), _) => seed,
                (None, Some(_)) => training.seed,
                (None, None) => clock_seed(),
            };
            info!(seed = training.seed, "using seed");
            if let Some(steps) = steps {
                training.steps = steps;
            }
            if let Some(batch_size) = batch_size {
                training.batch_size = batch_size;
            }
            if let Some(log_every) = log_every {
                training.log_every = log_every;
            }

            let report = train(&dataset, &model, &pipeline.architecture, pipeline.training)
                .context("training failed")?;
            info!(
                steps = report.steps_run,
                stop_reason = ?report.stop_reason,
                model = %model.display(),
                "done"
            );
        }
        Command::Generate { input, model, output, size } => {
            generate_file(&input, &model, &output, size).context("generation failed")?;
            info!(output = %output.display(), "wrote image");
        }
        Command::Sample { model, output, seed, size } => {
            let seed = seed.unwrap_or_else(clock_seed);
            info!(seed, "using seed");
            sample_file(&model, &output, seed, size).context("sampling failed")?;
            info!(output = %output.display(), "wrote image");
        }
    }
    Ok(())
}

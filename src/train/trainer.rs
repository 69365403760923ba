use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::dataset::ImageDataset;
use crate::error::{GanError, Result};
use crate::loss::gan::{discriminator_loss, generator_loss};
use crate::math::{Matrix, Tensor};
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::network::saved::SavedGenerator;
use crate::network::spec::{GanSpec, GeneratorInput};
use crate::optim::adam::Adam;
use crate::train::step_stats::StepStats;
use crate::train::stopping::StopReason;
use crate::train::train_config::TrainConfig;

/// Where a `GanTrainer` is in its lifecycle.
///
/// `Init` only exists while `GanTrainer::new` runs. Each `step` goes
/// `StepReady → DiscriminatorUpdated → GeneratorUpdated → StepReady`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Init,
    StepReady,
    DiscriminatorUpdated,
    GeneratorUpdated,
    Terminated(StopReason),
    Saved,
    /// A step returned an error part-way through. The networks may hold a
    /// half-applied update, so no further step is accepted.
    Failed,
}

/// Summary returned by `GanTrainer::run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub steps_run: usize,
    pub stop_reason: StopReason,
    /// Stats of every logged step, in order.
    pub history: Vec<StepStats>,
    pub last: Option<StepStats>,
}

/// Owns both networks, their optimizer state and the sampling RNG for one
/// training run.
pub struct GanTrainer {
    spec: GanSpec,
    config: TrainConfig,
    dataset: ImageDataset,
    generator: Network,
    discriminator: Network,
    g_opt: Adam,
    d_opt: Adam,
    rng: ChaCha8Rng,
    state: TrainingState,
    steps_done: usize,
    history: Vec<StepStats>,
    last: Option<StepStats>,
}

impl GanTrainer {
    /// Builds both networks from `spec`, seeded from `config.seed`.
    pub fn new(spec: GanSpec, config: TrainConfig, dataset: ImageDataset) -> Result<GanTrainer> {
        config.validate()?;
        if dataset.shape() != &spec.image_shape {
            return Err(GanError::InvalidConfig(format!(
                "dataset images are {} but the networks expect {}",
                dataset.shape(),
                spec.image_shape
            )));
        }

        let seed = config.seed;
        let generator = spec.generator_spec().build(seed)?;
        let discriminator = spec.discriminator_spec().build(seed.wrapping_add(1))?;
        debug!(
            generator_params = generator.parameter_count(),
            discriminator_params = discriminator.parameter_count(),
            seed,
            "built networks"
        );

        Ok(GanTrainer {
            g_opt: Adam::new(config.optimizer, &generator),
            d_opt: Adam::new(config.optimizer, &discriminator),
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(2)),
            spec,
            config,
            dataset,
            generator,
            discriminator,
            state: TrainingState::StepReady,
            steps_done: 0,
            history: Vec::new(),
            last: None,
        })
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn steps_done(&self) -> usize {
        self.steps_done
    }

    pub fn generator(&self) -> &Network {
        &self.generator
    }

    pub fn discriminator(&self) -> &Network {
        &self.discriminator
    }

    /// One adversarial step: update the discriminator on a fresh real batch
    /// and the generator's output for it, then update the generator against
    /// the just-updated discriminator.
    pub fn step(&mut self) -> Result<StepStats> {
        if self.state != TrainingState::StepReady {
            return Err(GanError::InvalidConfig(format!(
                "cannot step a trainer in state {:?}",
                self.state
            )));
        }
        let started = Instant::now();

        let real = self.dataset.sample_batch(self.config.batch_size, &mut self.rng);
        let (discriminator_loss, generator_loss) = match self.update_both(&real) {
            Ok(losses) => losses,
            Err(e) => {
                self.state = TrainingState::Failed;
                return Err(e);
            }
        };

        let stats = StepStats {
            step: self.steps_done,
            generator_loss,
            discriminator_loss,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.steps_done += 1;
        self.state = TrainingState::StepReady;

        if stats.step % self.config.log_every == 0 {
            info!(
                "Step {}: Generator loss = {:.6}, Discriminator loss = {:.6}",
                stats.step, stats.generator_loss, stats.discriminator_loss
            );
            self.history.push(stats.clone());
            if let Some(ref tx) = self.config.progress_tx {
                // Nobody listening is fine; the log line is the primary sink.
                let _ = tx.send(stats.clone());
            }
        }
        self.last = Some(stats.clone());
        Ok(stats)
    }

    /// Steps until the step bound, the stop flag or the stopping predicate
    /// ends the run.
    pub fn run(&mut self) -> Result<TrainingReport> {
        info!(steps = self.config.steps, batch_size = self.config.batch_size, "starting adversarial training");

        let reason = loop {
            if self.steps_done >= self.config.steps {
                break StopReason::StepLimit;
            }
            if let Some(ref flag) = self.config.stop_flag {
                if flag.load(Ordering::Relaxed) {
                    break StopReason::Cancelled;
                }
            }
            let stats = self.step()?;
            if let Some(predicate) = self.config.stopping.as_mut() {
                if !predicate.should_continue(&stats) {
                    break StopReason::Predicate;
                }
            }
        };

        self.state = TrainingState::Terminated(reason);
        info!(steps = self.steps_done, ?reason, "training finished");

        Ok(TrainingReport {
            steps_run: self.steps_done,
            stop_reason: reason,
            history: self.history.clone(),
            last: self.last.clone(),
        })
    }

    /// Writes the generator and its metadata to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let metadata = ModelMetadata {
            description: self.config.description.clone(),
            trained_steps: Some(self.steps_done),
            seed: Some(self.config.seed),
            final_generator_loss: self.last.as_ref().map(|s| s.generator_loss),
            final_discriminator_loss: self.last.as_ref().map(|s| s.discriminator_loss),
        };
        SavedGenerator::new(self.generator.clone(), self.spec.generator_input, metadata)
            .save_json(path)?;
        self.state = TrainingState::Saved;
        info!(path = %path.display(), "saved generator");
        Ok(())
    }

    fn update_both(&mut self, real: &Matrix) -> Result<(f64, f64)> {
        let discriminator_loss = self.discriminator_step(real)?;
        let generator_loss = self.generator_step(real)?;
        Ok((discriminator_loss, generator_loss))
    }

    /// Generator input for a batch: the real images themselves, or fresh
    /// latent noise with one row per real image.
    fn generator_input(&mut self, real: &Matrix) -> Result<Tensor> {
        let input = match self.spec.generator_input {
            GeneratorInput::Image => real.clone(),
            GeneratorInput::Latent { dim } => Matrix::normal(real.rows, dim, 1.0, &mut self.rng),
        };
        Tensor::from_matrix(&input, self.generator.input.shape.clone())
    }

    /// Updates discriminator parameters only, from real and freshly generated
    /// images in one stacked batch. Returns the summed loss.
    fn discriminator_step(&mut self, real: &Matrix) -> Result<f64> {
        let input = self.generator_input(real)?;
        let fake = self.generator.predict(&input)?.to_matrix();

        let both = Tensor::from_matrix(&real.vstack(&fake), self.spec.image_shape.clone())?;
        self.discriminator.zero_grad();
        let logits = self.discriminator.forward(&both)?.to_matrix();
        let (real_logits, fake_logits) = logits.split_rows(real.rows);

        let loss = discriminator_loss(&real_logits, &fake_logits, self.config.smoothing);
        self.discriminator.backward(&loss.real.grad.vstack(&loss.fake.grad));
        self.d_opt.step(&mut self.discriminator);

        self.state = TrainingState::DiscriminatorUpdated;
        Ok(loss.value())
    }

    /// Updates generator parameters only. Fake images are generated anew and
    /// scored by the current discriminator, whose gradients are not kept.
    fn generator_step(&mut self, real: &Matrix) -> Result<f64> {
        let input = self.generator_input(real)?;
        self.generator.zero_grad();
        let fake = self.generator.forward(&input)?;
        let logits = self.discriminator.forward(&fake)?.to_matrix();

        let loss = generator_loss(&logits);
        let grad_fake = self.discriminator.backward_input(&loss.grad);
        self.generator.backward(&grad_fake);
        self.g_opt.step(&mut self.generator);

        self.state = TrainingState::GeneratorUpdated;
        Ok(loss.value)
    }
}

pub mod bce;
pub mod gan;

pub use bce::BceWithLogitsLoss;
pub use gan::{discriminator_loss, generator_loss, DiscriminatorLoss, LabelSmoothing, LossOutput};

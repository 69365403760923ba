pub mod metadata;
pub mod network;
pub mod saved;
pub mod spec;

pub use metadata::ModelMetadata;
pub use network::{Network, Port, Role};
pub use saved::SavedGenerator;
pub use spec::{GanSpec, GeneratorInput, NetworkSpec};

//! Backend module - model host trait, Replicate client, and model registry

pub mod registry;
pub mod replicate;
pub mod traits;

pub use registry::{ModelDescriptor, ModelRegistry, DEFAULT_MODEL_KEY};
pub use replicate::ReplicateBackend;
pub use traits::{check_prediction_id, ModelHost, ModelOutput, Prediction, PredictionStatus, TryOnInput};

//! Model management: registry client, artifact format, active-model slot and
//! the lifecycle manager that ties them together.

pub mod artifact;

mod lifecycle;
mod registry;
mod slot;

pub use artifact::{ModelArtifact, ScalerParams, ARTIFACT_FILE, ARTIFACT_FORMAT};
pub use lifecycle::{LifecycleManager, LoadOutcome, ModelTarget};
pub use registry::{
    artifact_location, ArtifactLocation, MlflowRegistry, RegistryClient, RegistryConfig,
    RegistryError,
};
pub use slot::{ActiveModel, LoadedModel, ModelIdentity, ModelSlot};

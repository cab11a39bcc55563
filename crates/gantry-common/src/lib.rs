pub mod deployment;
pub mod environment;
pub mod error;
pub mod model;
pub mod node;
pub mod queue;
pub mod strategy;
pub mod telemetry;

pub use deployment::{
    DeployedModelInfo, DeployedModelState, DeploymentSummary, GpuDeploymentStatus,
    ModelDeploymentStat, NodeDeploymentStatus, SwitchOutcome,
};
pub use environment::Environment;
pub use error::ReconcileError;
pub use model::ModelSpec;
pub use node::{GpuTelemetry, ModelInstance, NodeHealth, NodeRecord};
pub use queue::{QueueDepth, QueueDepthSample};
pub use strategy::SchedulingStrategy;

pub mod api;
pub mod captioner;
pub mod config;
pub mod error;
pub mod narrative;
pub mod pipeline;
pub mod registry;
pub mod scene;
pub mod speech;
pub mod video;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::{MissingAudioPolicy, PipelineConfig, TransitionSettings};
pub use error::{Result, Stage, VideoError};
pub use pipeline::{NarrationPipeline, RunReport, RunRequest};
pub use registry::ModelRegistry;
pub use video::SlideDirection;

pub mod cue;
pub mod error;
pub mod interval;
pub mod orchestrator;
pub mod sprite;

pub use orchestrator::ThumbnailPipeline;

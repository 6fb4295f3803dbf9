use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod probe;
pub mod sampler;

pub use probe::FfprobeProber;
pub use sampler::FfmpegSampler;

/// Sampled frames are written as `frame_00001.jpg`, `frame_00002.jpg`, ...
/// so that lexical order is temporal order.
pub const FRAME_PREFIX: &str = "frame_";
pub const FRAME_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSpec {
    pub interval: f64,
    pub tile_w: u32,
    pub tile_h: u32,
    /// Hard ceiling on emitted frames.
    pub max_frames: u32,
}

/// Turns a video into letterboxed still frames of exactly `tile_w x tile_h`,
/// one every `interval` seconds.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    async fn sample(
        &self,
        source: &Path,
        out_dir: &Path,
        spec: SampleSpec,
    ) -> Result<(), SamplerError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaInfo {
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Best-effort metadata lookup. Anything that goes wrong yields unknown fields.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, source: &Path) -> MediaInfo;
}

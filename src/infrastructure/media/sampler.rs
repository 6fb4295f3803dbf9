use super::{FRAME_EXTENSION, FRAME_PREFIX, FrameSampler, SampleSpec, SamplerError};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

pub struct FfmpegSampler {
    bin: String,
}

impl FfmpegSampler {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

/// fps first so only the kept frames are scaled, then fit inside the tile and
/// pad the rest black, centered.
pub fn build_filter(spec: SampleSpec) -> String {
    let SampleSpec {
        interval,
        tile_w,
        tile_h,
        ..
    } = spec;
    format!(
        "fps=1/{interval},\
         scale={tile_w}:{tile_h}:force_original_aspect_ratio=decrease,\
         pad={tile_w}:{tile_h}:(ow-iw)/2:(oh-ih)/2:color=black"
    )
}

#[async_trait]
impl FrameSampler for FfmpegSampler {
    async fn sample(
        &self,
        source: &Path,
        out_dir: &Path,
        spec: SampleSpec,
    ) -> Result<(), SamplerError> {
        let pattern = out_dir.join(format!("{FRAME_PREFIX}%05d.{FRAME_EXTENSION}"));
        let filter = build_filter(spec);
        info!(
            "🎞️ Sampling {} every {}s into {}",
            source.display(),
            spec.interval,
            out_dir.display()
        );
        debug!(filter = %filter, "ffmpeg filter");

        let output = Command::new(&self.bin)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(source)
            .args(["-vf", &filter])
            .args(["-frames:v", &spec.max_frames.to_string()])
            .arg(&pattern)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SamplerError::Spawn {
                tool: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SamplerError::Failed {
                tool: self.bin.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

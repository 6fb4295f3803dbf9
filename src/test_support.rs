//! Stand-ins for ffmpeg and ffprobe plus state builders shared by unit tests.

use crate::config::settings::AppConfig;
use crate::infrastructure::download::SourceFetcher;
use crate::infrastructure::media::{
    FrameSampler, MediaInfo, MediaProber, SampleSpec, SamplerError,
};
use crate::modules::thumbnails::callback::CallbackNotifier;
use crate::pipeline::ThumbnailPipeline;
use crate::state::AppState;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum SamplerBehavior {
    Frames(usize),
    Fail(String),
}

#[derive(Clone)]
pub struct FakeSampler {
    behavior: SamplerBehavior,
    delay: Duration,
    last: Arc<Mutex<Option<SampleSpec>>>,
}

impl FakeSampler {
    pub fn new(behavior: SamplerBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            last: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn last_spec(&self) -> Option<SampleSpec> {
        *self.last.lock().unwrap()
    }
}

#[async_trait]
impl FrameSampler for FakeSampler {
    async fn sample(
        &self,
        _source: &Path,
        out_dir: &Path,
        spec: SampleSpec,
    ) -> Result<(), SamplerError> {
        *self.last.lock().unwrap() = Some(spec);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            SamplerBehavior::Frames(n) => {
                write_frames(out_dir, *n, spec.tile_w, spec.tile_h);
                Ok(())
            }
            SamplerBehavior::Fail(stderr) => Err(SamplerError::Failed {
                tool: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            }),
        }
    }
}

pub struct FakeProber(MediaInfo);

impl FakeProber {
    pub fn duration(seconds: f64) -> Self {
        Self(MediaInfo {
            duration: Some(seconds),
            width: Some(1920),
            height: Some(1080),
        })
    }

    pub fn unknown() -> Self {
        Self(MediaInfo::default())
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, _source: &Path) -> MediaInfo {
        self.0
    }
}

/// Grey levels only, so chroma subsampling cannot smear colours between cells.
pub fn frame_color(index: usize) -> Rgb<u8> {
    let v = 40 + ((index * 53) % 200) as u8;
    Rgb([v, v, v])
}

pub fn write_frames(dir: &Path, count: usize, tile_w: u32, tile_h: u32) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).unwrap();
    (0..count)
        .map(|i| {
            let path = dir.join(format!("frame_{:05}.jpg", i + 1));
            RgbImage::from_pixel(tile_w, tile_h, frame_color(i))
                .save(&path)
                .unwrap();
            path
        })
        .collect()
}

pub fn test_pipeline(sampler: FakeSampler, prober: FakeProber) -> ThumbnailPipeline {
    ThumbnailPipeline::new(
        Arc::new(sampler),
        Arc::new(prober),
        SourceFetcher::new().unwrap(),
    )
}

pub fn test_config() -> AppConfig {
    AppConfig::from_source(&|_: &str| -> Option<String> { None }).unwrap()
}

pub fn test_state(sampler: FakeSampler, prober: FakeProber) -> AppState {
    let config = test_config();
    let notifier = CallbackNotifier::new(&config.callback).unwrap();
    AppState::new(config, test_pipeline(sampler, prober), notifier)
}

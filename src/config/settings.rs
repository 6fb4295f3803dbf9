use crate::config::env::{self, EnvKey, EnvSource, ProcessEnv};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("YTMS_WORKERS must be at least 1")]
    NoWorkers,
    #[error("YTMS_MAX_FRAMES must be at least 1")]
    NoFrameBudget,
    #[error("interval bounds are inverted: min {min} > max {max}")]
    InvertedIntervalBounds { min: f64, max: f64 },
    #[error("{0} must be a positive number of seconds")]
    NonPositiveInterval(&'static str),
    #[error("YTMS_PREVIEW_SHORT_MAX_SEC must not exceed YTMS_PREVIEW_MEDIUM_MAX_SEC")]
    InvertedThresholds,
}

/// Values the orchestrator needs for one run. Passed in by reference at call
/// time, never read from globals.
#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    pub default_tile_w: u32,
    pub default_tile_h: u32,
    pub default_cols: u32,
    pub default_rows: u32,

    pub interval_short: f64,
    pub interval_medium: f64,
    pub interval_long: f64,
    pub short_max_sec: f64,
    pub medium_max_sec: f64,

    pub max_frames: u32,
    pub min_interval_sec: f64,
    pub max_interval_sec: f64,

    pub sprites_dir: String,
    pub sprite_web_base: String,
    pub cue_file_name: String,
    pub jpeg_quality: u8,
    pub tool_error_limit: usize,
    pub download_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_tile_w: 160,
            default_tile_h: 90,
            default_cols: 10,
            default_rows: 10,
            interval_short: 2.0,
            interval_medium: 4.0,
            interval_long: 6.0,
            short_max_sec: 15.0 * 60.0,
            medium_max_sec: 60.0 * 60.0,
            max_frames: 1000,
            min_interval_sec: 0.2,
            max_interval_sec: 120.0,
            sprites_dir: "sprites".to_string(),
            sprite_web_base: "sprites".to_string(),
            cue_file_name: "thumbs.vtt".to_string(),
            jpeg_quality: 85,
            tool_error_limit: 2000,
            download_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CallbackConfig {
    /// Signing secret used when a job carries no token of its own.
    pub global_auth_token: String,
    pub timeout: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            global_auth_token: "dev-secret".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub workers: usize,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub pipeline: PipelineConfig,
    pub callback: CallbackConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self, ConfigError> {
        let d = PipelineConfig::default();
        let sprites_dir = env::get_or(source, EnvKey::SpritesDir, &d.sprites_dir);
        let sprite_web_base = env::get_or(source, EnvKey::SpriteWebBase, &sprites_dir);

        let pipeline = PipelineConfig {
            default_tile_w: env::get_parsed(source, EnvKey::DefaultTileWidth, d.default_tile_w),
            default_tile_h: env::get_parsed(source, EnvKey::DefaultTileHeight, d.default_tile_h),
            default_cols: env::get_parsed(source, EnvKey::DefaultCols, d.default_cols),
            default_rows: env::get_parsed(source, EnvKey::DefaultRows, d.default_rows),
            interval_short: env::get_parsed(source, EnvKey::IntervalShort, d.interval_short),
            interval_medium: env::get_parsed(source, EnvKey::IntervalMedium, d.interval_medium),
            interval_long: env::get_parsed(source, EnvKey::IntervalLong, d.interval_long),
            short_max_sec: env::get_parsed(source, EnvKey::ShortMaxSec, d.short_max_sec),
            medium_max_sec: env::get_parsed(source, EnvKey::MediumMaxSec, d.medium_max_sec),
            max_frames: env::get_parsed(source, EnvKey::MaxFrames, d.max_frames),
            min_interval_sec: env::get_parsed(source, EnvKey::MinIntervalSec, d.min_interval_sec),
            max_interval_sec: env::get_parsed(source, EnvKey::MaxIntervalSec, d.max_interval_sec),
            sprites_dir,
            sprite_web_base,
            cue_file_name: env::get_or(source, EnvKey::CueFileName, &d.cue_file_name),
            jpeg_quality: env::get_parsed(source, EnvKey::JpegQuality, d.jpeg_quality).clamp(1, 100),
            tool_error_limit: env::get_parsed(source, EnvKey::ToolErrorLimit, d.tool_error_limit),
            download_timeout: Duration::from_secs(env::get_parsed(
                source,
                EnvKey::DownloadTimeoutSec,
                d.download_timeout.as_secs(),
            )),
        };

        let cb = CallbackConfig::default();
        let callback = CallbackConfig {
            global_auth_token: env::get_or(source, EnvKey::GlobalAuthToken, &cb.global_auth_token),
            timeout: Duration::from_secs(env::get_parsed(
                source,
                EnvKey::CallbackTimeoutSec,
                cb.timeout.as_secs(),
            )),
        };

        let config = Self {
            server_port: env::get_parsed(source, EnvKey::ServerPort, 8000),
            workers: env::get_parsed(source, EnvKey::Workers, 1),
            ffmpeg_bin: env::get_or(source, EnvKey::FfmpegBin, "ffmpeg"),
            ffprobe_bin: env::get_or(source, EnvKey::FfprobeBin, "ffprobe"),
            pipeline,
            callback,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if p.max_frames == 0 {
            return Err(ConfigError::NoFrameBudget);
        }
        for (name, value) in [
            ("YTMS_MIN_INTERVAL_SEC", p.min_interval_sec),
            ("YTMS_PREVIEW_INTERVAL_SHORT", p.interval_short),
            ("YTMS_PREVIEW_INTERVAL_MEDIUM", p.interval_medium),
            ("YTMS_PREVIEW_INTERVAL_LONG", p.interval_long),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveInterval(name));
            }
        }
        if p.min_interval_sec > p.max_interval_sec {
            return Err(ConfigError::InvertedIntervalBounds {
                min: p.min_interval_sec,
                max: p.max_interval_sec,
            });
        }
        if p.short_max_sec > p.medium_max_sec {
            return Err(ConfigError::InvertedThresholds);
        }
        Ok(())
    }
}

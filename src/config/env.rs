use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    Workers,
    GlobalAuthToken,
    DefaultTileWidth,
    DefaultTileHeight,
    DefaultCols,
    DefaultRows,
    IntervalShort,
    IntervalMedium,
    IntervalLong,
    ShortMaxSec,
    MediumMaxSec,
    MaxFrames,
    MinIntervalSec,
    MaxIntervalSec,
    SpritesDir,
    SpriteWebBase,
    CueFileName,
    JpegQuality,
    FfmpegBin,
    FfprobeBin,
    ToolErrorLimit,
    CallbackTimeoutSec,
    DownloadTimeoutSec,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "YTMS_PORT",
            EnvKey::Workers => "YTMS_WORKERS",
            EnvKey::GlobalAuthToken => "YTMS_GLOBAL_AUTH_TOKEN",
            EnvKey::DefaultTileWidth => "YTMS_DEFAULT_TILE_W",
            EnvKey::DefaultTileHeight => "YTMS_DEFAULT_TILE_H",
            EnvKey::DefaultCols => "YTMS_DEFAULT_COLS",
            EnvKey::DefaultRows => "YTMS_DEFAULT_ROWS",
            EnvKey::IntervalShort => "YTMS_PREVIEW_INTERVAL_SHORT",
            EnvKey::IntervalMedium => "YTMS_PREVIEW_INTERVAL_MEDIUM",
            EnvKey::IntervalLong => "YTMS_PREVIEW_INTERVAL_LONG",
            EnvKey::ShortMaxSec => "YTMS_PREVIEW_SHORT_MAX_SEC",
            EnvKey::MediumMaxSec => "YTMS_PREVIEW_MEDIUM_MAX_SEC",
            EnvKey::MaxFrames => "YTMS_MAX_FRAMES",
            EnvKey::MinIntervalSec => "YTMS_MIN_INTERVAL_SEC",
            EnvKey::MaxIntervalSec => "YTMS_MAX_INTERVAL_SEC",
            EnvKey::SpritesDir => "YTMS_SPRITES_DIR",
            EnvKey::SpriteWebBase => "YTMS_SPRITE_WEB_BASE",
            EnvKey::CueFileName => "YTMS_CUE_FILE_NAME",
            EnvKey::JpegQuality => "YTMS_JPEG_QUALITY",
            EnvKey::FfmpegBin => "YTMS_FFMPEG_BIN",
            EnvKey::FfprobeBin => "YTMS_FFPROBE_BIN",
            EnvKey::ToolErrorLimit => "YTMS_TOOL_ERROR_LIMIT",
            EnvKey::CallbackTimeoutSec => "YTMS_CALLBACK_TIMEOUT_SEC",
            EnvKey::DownloadTimeoutSec => "YTMS_DOWNLOAD_TIMEOUT_SEC",
        }
    }
}

/// A place configuration values are read from. The process environment in
/// production, a plain map in tests.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

pub fn get(source: &impl EnvSource, key: EnvKey) -> Option<String> {
    source
        .var(key.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_or(source: &impl EnvSource, key: EnvKey, default: &str) -> String {
    get(source, key).unwrap_or_else(|| default.to_string())
}

pub fn get_parsed<T: FromStr>(source: &impl EnvSource, key: EnvKey, default: T) -> T {
    match get(source, key) {
        Some(val) => val.parse::<T>().unwrap_or(default),
        None => default,
    }
}

use super::{MediaInfo, MediaProber};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct FfprobeProber {
    bin: String,
}

impl FfprobeProber {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Reads `-print_format json -show_format -show_streams` output. Container
/// duration wins over the video stream's.
pub fn parse_probe_output(stdout: &[u8]) -> MediaInfo {
    let Ok(probe) = serde_json::from_slice::<FfprobeOutput>(stdout) else {
        return MediaInfo::default();
    };

    let video = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    });

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds)
        .or_else(|| {
            video
                .and_then(|v| v.duration.as_deref())
                .and_then(parse_seconds)
        });

    MediaInfo {
        duration,
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
    }
}

fn parse_seconds(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, source: &Path) -> MediaInfo {
        let output = Command::new(&self.bin)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(source)
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let info = parse_probe_output(&output.stdout);
                debug!(?info, "Probed {}", source.display());
                info
            }
            Ok(output) => {
                warn!(
                    "{} could not read {} ({}), duration unknown",
                    self.bin,
                    source.display(),
                    output.status
                );
                MediaInfo::default()
            }
            Err(e) => {
                warn!("{} unavailable: {}, duration unknown", self.bin, e);
                MediaInfo::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_duration_and_dimensions() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio", "duration": "10.0"},
                {"codec_type": "video", "width": 1920, "height": 1080, "duration": "599.9"}
            ],
            "format": {"duration": "600.040000"}
        }"#;
        let info = parse_probe_output(json);
        assert_eq!(info.duration, Some(600.04));
        assert_eq!(info.width, Some(1920));
        assert_eq!(info.height, Some(1080));
    }

    #[test]
    fn falls_back_to_stream_duration() {
        let json = br#"{"streams": [{"codec_type": "video", "duration": "42.5"}], "format": {}}"#;
        assert_eq!(parse_probe_output(json).duration, Some(42.5));
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(parse_probe_output(b"not json"), MediaInfo::default());
        let json = br#"{"format": {"duration": "N/A"}}"#;
        assert_eq!(parse_probe_output(json).duration, None);
    }

    #[tokio::test]
    async fn missing_tool_is_unknown() {
        let prober = FfprobeProber::new("definitely-not-ffprobe-on-this-host");
        let info = prober.probe(Path::new("whatever.mp4")).await;
        assert_eq!(info, MediaInfo::default());
    }
}

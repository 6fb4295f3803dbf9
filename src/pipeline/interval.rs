//! Sampling interval selection.
//!
//! A caller-supplied interval is clamped to the configured bounds. Without one,
//! the interval follows the probed duration: short videos are sampled densely,
//! long ones sparsely. The frame budget then widens the interval if the video
//! would otherwise produce more than `max_frames` stills.

use crate::config::settings::PipelineConfig;

pub fn select_interval(requested: Option<f64>, duration: Option<f64>, config: &PipelineConfig) -> f64 {
    if let Some(requested) = requested.filter(|v| v.is_finite() && *v > 0.0) {
        return requested.clamp(config.min_interval_sec, config.max_interval_sec);
    }

    match duration {
        Some(d) if d <= config.short_max_sec => config.interval_short,
        Some(d) if d <= config.medium_max_sec => config.interval_medium,
        Some(_) => config.interval_long,
        None => config.interval_medium,
    }
}

/// Estimated number of frames a fixed-rate sample produces.
pub fn estimate_frames(duration: f64, interval: f64) -> f64 {
    duration / interval
}

pub fn apply_frame_budget(interval: f64, duration: Option<f64>, config: &PipelineConfig) -> f64 {
    let Some(duration) = duration else {
        return interval;
    };
    let cap = f64::from(config.max_frames);
    if estimate_frames(duration, interval) <= cap {
        return interval;
    }
    config.min_interval_sec.max(duration / cap)
}

use super::cue::{self, CueSpec};
use super::error::{PipelineError, truncate_diagnostic};
use super::interval;
use super::sprite::{self, PackedSheet, SheetLayout};
use crate::config::settings::PipelineConfig;
use crate::infrastructure::download::SourceFetcher;
use crate::infrastructure::media::{
    FRAME_EXTENSION, FRAME_PREFIX, FrameSampler, MediaProber, SampleSpec,
};
use crate::modules::thumbnails::model::{
    CueFileInfo, CueMeta, JobParams, SpriteInfo, ThumbnailsResult, VideoSource,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Source → frames → sprite sheets → cue file, for one job at a time.
#[derive(Clone)]
pub struct ThumbnailPipeline {
    sampler: Arc<dyn FrameSampler>,
    prober: Arc<dyn MediaProber>,
    fetcher: SourceFetcher,
}

impl ThumbnailPipeline {
    pub fn new(
        sampler: Arc<dyn FrameSampler>,
        prober: Arc<dyn MediaProber>,
        fetcher: SourceFetcher,
    ) -> Self {
        Self {
            sampler,
            prober,
            fetcher,
        }
    }

    /// Runs the whole pipeline. The job's scratch directory is removed
    /// afterwards whatever the outcome.
    pub async fn run(
        &self,
        job_id: Uuid,
        params: &JobParams,
        config: &PipelineConfig,
    ) -> Result<ThumbnailsResult, PipelineError> {
        let out_base = params.out_base_path.as_path();
        let scratch = scratch_dir(out_base, job_id);
        info!(%job_id, video_id = %params.video_id, "🚀 Pipeline started");

        let outcome = self.execute(out_base, &scratch, params, config).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Could not remove scratch dir {}: {}", scratch.display(), e);
            }
        }
        outcome
    }

    async fn execute(
        &self,
        out_base: &Path,
        scratch: &Path,
        params: &JobParams,
        config: &PipelineConfig,
    ) -> Result<ThumbnailsResult, PipelineError> {
        let frames_dir = scratch.join("frames");
        tokio::fs::create_dir_all(&frames_dir)
            .await
            .map_err(|e| PipelineError::io("failed to create", &frames_dir, e))?;

        // 1. source
        let source = self.resolve_source(&params.source, scratch, config).await?;

        // 2. probe
        let media = self.prober.probe(&source).await;

        // 3 + 4. interval and frame budget
        let selected = interval::select_interval(params.interval_sec, media.duration, config);
        let interval = interval::apply_frame_budget(selected, media.duration, config);
        if interval != selected {
            info!(
                "⏱️ Frame budget widened interval from {}s to {}s (duration {:?}s, cap {})",
                selected, interval, media.duration, config.max_frames
            );
        }

        // 5. tile and grid
        let layout = effective_layout(params, config);
        layout
            .checked_sheet_size()
            .map_err(|e| PipelineError::Compose(e.to_string()))?;

        // 6. sample
        let spec = SampleSpec {
            interval,
            tile_w: layout.tile_w,
            tile_h: layout.tile_h,
            max_frames: config.max_frames,
        };
        self.sampler
            .sample(&source, &frames_dir, spec)
            .await
            .map_err(|e| {
                PipelineError::ExtractionFailure(truncate_diagnostic(
                    &e.to_string(),
                    config.tool_error_limit,
                ))
            })?;

        // 7. enumerate
        let frames = list_frames(&frames_dir).await?;
        if frames.is_empty() {
            return Err(PipelineError::EmptyResult);
        }
        let frame_count = frames.len();
        info!(frames = frame_count, interval, "🖼️ Frames extracted");

        // 8. pack, staged in scratch so a failed run never touches out_base
        let staging = scratch.join("sprites");
        let staged =
            sprite::pack_sprites(frames, staging.clone(), layout, config.jpeg_quality).await?;

        // 9. cues
        let staged_cue = staging.join(&config.cue_file_name);
        let cue_spec = CueSpec {
            frames: frame_count,
            interval,
            layout,
            web_base: &config.sprite_web_base,
        };
        cue::write_cues(&staged_cue, &cue_spec).await?;

        let sprites_dir = out_base.join(&config.sprites_dir);
        let cue_path = sprites_dir.join(&config.cue_file_name);
        let sheets = publish(&staged, &staged_cue, &sprites_dir, &cue_path).await?;

        // 11. result
        Ok(assemble_result(
            out_base,
            &sheets,
            &cue_path,
            layout,
            interval,
            frame_count,
        ))
    }

    async fn resolve_source(
        &self,
        source: &VideoSource,
        scratch: &Path,
        config: &PipelineConfig,
    ) -> Result<PathBuf, PipelineError> {
        let path = match source {
            VideoSource::Path(path) => path.clone(),
            VideoSource::Url(url) => self
                .fetcher
                .fetch(url, scratch, config.download_timeout)
                .await
                .map_err(|e| PipelineError::DownloadFailure(e.to_string()))?,
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(PipelineError::SourceNotFound(path.display().to_string())),
        }
    }
}

/// Caller tile and grid values, falling back to the configured defaults.
pub fn effective_layout(params: &JobParams, config: &PipelineConfig) -> SheetLayout {
    SheetLayout {
        tile_w: params.tile_w.unwrap_or(config.default_tile_w),
        tile_h: params.tile_h.unwrap_or(config.default_tile_h),
        cols: params.cols.unwrap_or(config.default_cols).max(1),
        rows: params.rows.unwrap_or(config.default_rows).max(1),
    }
}

pub fn scratch_dir(out_base: &Path, job_id: Uuid) -> PathBuf {
    out_base.join(format!(".work-{job_id}"))
}

/// Frame files in lexical order, which is temporal order thanks to the
/// zero-padded sequence numbers.
pub async fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PipelineError::io("failed to list", dir, e))?;

    let mut frames = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::io("failed to list", dir, e))?
    {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.starts_with(FRAME_PREFIX) && name.ends_with(&format!(".{FRAME_EXTENSION}")) {
            frames.push(entry.path());
        }
    }
    frames.sort();
    Ok(frames)
}

fn relative_to(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn assemble_result(
    out_base: &Path,
    sheets: &[PackedSheet],
    cue_path: &Path,
    layout: SheetLayout,
    interval: f64,
    frames: usize,
) -> ThumbnailsResult {
    let sprites = sheets
        .iter()
        .map(|sheet| SpriteInfo {
            path: relative_to(out_base, &sheet.path),
            index: sheet.index as u32,
        })
        .collect();

    ThumbnailsResult {
        sprites,
        vtt: CueFileInfo {
            path: relative_to(out_base, cue_path),
            meta: CueMeta {
                tile_w: layout.tile_w,
                tile_h: layout.tile_h,
                cols: layout.cols,
                rows: layout.rows,
                interval,
                frames: frames as u32,
            },
        },
    }
}

/// Moves staged sheets and the cue file into the output tree. Sheets already
/// moved are removed again if a later move fails.
async fn publish(
    staged: &[PackedSheet],
    staged_cue: &Path,
    sprites_dir: &Path,
    cue_path: &Path,
) -> Result<Vec<PackedSheet>, PipelineError> {
    let mut published = Vec::with_capacity(staged.len());
    let outcome = async {
        tokio::fs::create_dir_all(sprites_dir)
            .await
            .map_err(|e| PipelineError::io("failed to create", sprites_dir, e))?;
        for sheet in staged {
            let target = sprites_dir.join(sprite::sheet_file_name(sheet.index));
            move_file(&sheet.path, &target).await?;
            published.push(PackedSheet {
                path: target,
                ..sheet.clone()
            });
        }
        if let Some(parent) = cue_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io("failed to create", parent, e))?;
        }
        move_file(staged_cue, cue_path).await
    }
    .await;

    match outcome {
        Ok(()) => Ok(published),
        Err(e) => {
            discard_sheets(published).await;
            Err(e)
        }
    }
}

/// Rename, falling back to copy + delete when the two paths sit on
/// different filesystems.
async fn move_file(from: &Path, to: &Path) -> Result<(), PipelineError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| PipelineError::io("failed to publish", to, e))?;
    let _ = tokio::fs::remove_file(from).await;
    Ok(())
}

async fn discard_sheets(sheets: Vec<PackedSheet>) {
    if sheets.is_empty() {
        return;
    }
    let removed = tokio::task::spawn_blocking(move || sprite::remove_sheets(&sheets)).await;
    if let Err(e) = removed {
        warn!("Sprite cleanup task failed: {}", e);
    }
}

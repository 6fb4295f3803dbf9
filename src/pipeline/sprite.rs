use super::error::PipelineError;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, imageops};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Largest sheet edge a JPEG header can describe.
pub const MAX_SHEET_EDGE: u64 = 65_535;

/// Cap on one RGB canvas: 64 Mpx, roughly 200 MiB.
pub const MAX_SHEET_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum SheetSizeError {
    #[error("sprite sheet {width}x{height} has no area")]
    Empty { width: u64, height: u64 },
    #[error("sprite sheet {width}x{height} exceeds the {MAX_SHEET_EDGE}px JPEG edge limit")]
    EdgeTooLong { width: u64, height: u64 },
    #[error("sprite sheet {width}x{height} exceeds {MAX_SHEET_PIXELS} pixels")]
    TooManyPixels { width: u64, height: u64 },
}

/// Tile size and grid shape shared by the packer and the cue writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub tile_w: u32,
    pub tile_h: u32,
    pub cols: u32,
    pub rows: u32,
}

impl SheetLayout {
    pub fn per_sheet(&self) -> usize {
        (self.cols as usize) * (self.rows as usize)
    }

    /// Sheet dimensions, refused before anything is allocated when the
    /// canvas could not be encoded or would not fit in memory.
    pub fn checked_sheet_size(&self) -> Result<(u32, u32), SheetSizeError> {
        let width = u64::from(self.cols) * u64::from(self.tile_w);
        let height = u64::from(self.rows) * u64::from(self.tile_h);
        if width == 0 || height == 0 {
            return Err(SheetSizeError::Empty { width, height });
        }
        if width > MAX_SHEET_EDGE || height > MAX_SHEET_EDGE {
            return Err(SheetSizeError::EdgeTooLong { width, height });
        }
        if width * height > MAX_SHEET_PIXELS {
            return Err(SheetSizeError::TooManyPixels { width, height });
        }
        Ok((width as u32, height as u32))
    }

    pub fn sheet_count(&self, frames: usize) -> usize {
        frames.div_ceil(self.per_sheet())
    }

    /// 1-based sheet holding the frame with this 0-based global index.
    pub fn sheet_of(&self, frame: usize) -> usize {
        frame / self.per_sheet() + 1
    }

    /// Pixel origin of the frame with this 0-based global index within its sheet.
    pub fn cell_origin(&self, frame: usize) -> (u32, u32) {
        let cell = frame % self.per_sheet();
        let cols = self.cols as usize;
        let x = (cell % cols) as u32 * self.tile_w;
        let y = (cell / cols) as u32 * self.tile_h;
        (x, y)
    }
}

pub fn sheet_file_name(index: usize) -> String {
    format!("sprite_{index:04}.jpg")
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackedSheet {
    /// 1-based, in emission order.
    pub index: usize,
    pub path: PathBuf,
    pub frames: usize,
}

/// Composites frames into grid sheets on the blocking pool.
pub async fn pack_sprites(
    frames: Vec<PathBuf>,
    out_dir: PathBuf,
    layout: SheetLayout,
    quality: u8,
) -> Result<Vec<PackedSheet>, PipelineError> {
    tokio::task::spawn_blocking(move || pack_sprites_blocking(&frames, &out_dir, layout, quality))
        .await
        .map_err(|e| PipelineError::Compose(format!("packing task aborted: {e}")))?
}

/// On error every sheet this call already wrote is removed again.
pub fn pack_sprites_blocking(
    frames: &[PathBuf],
    out_dir: &Path,
    layout: SheetLayout,
    quality: u8,
) -> Result<Vec<PackedSheet>, PipelineError> {
    let (width, height) = layout
        .checked_sheet_size()
        .map_err(|e| PipelineError::Compose(e.to_string()))?;
    fs::create_dir_all(out_dir).map_err(|e| PipelineError::io("failed to create", out_dir, e))?;

    let mut sheets = Vec::with_capacity(layout.sheet_count(frames.len()));
    for (chunk_no, chunk) in frames.chunks(layout.per_sheet()).enumerate() {
        let index = chunk_no + 1;
        let path = out_dir.join(sheet_file_name(index));
        let canvas = compose_sheet(chunk, layout, width, height);

        if let Err(e) = save_jpeg(&canvas, &path, quality) {
            let _ = fs::remove_file(&path);
            remove_sheets(&sheets);
            return Err(e);
        }
        debug!(index, frames = chunk.len(), "Sprite sheet written to {}", path.display());
        sheets.push(PackedSheet {
            index,
            path,
            frames: chunk.len(),
        });
    }

    Ok(sheets)
}

fn compose_sheet(chunk: &[PathBuf], layout: SheetLayout, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    for (i, frame) in chunk.iter().enumerate() {
        let tile = match image::open(frame) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("Skipping unreadable frame {}: {}", frame.display(), e);
                continue;
            }
        };
        // never let an oversized frame bleed into the neighbouring cell
        let tile = if tile.dimensions() == (layout.tile_w, layout.tile_h) {
            tile
        } else {
            imageops::crop_imm(&tile, 0, 0, layout.tile_w, layout.tile_h).to_image()
        };
        let (x, y) = layout.cell_origin(i);
        imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    canvas
}

fn save_jpeg(canvas: &RgbImage, path: &Path, quality: u8) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io("failed to create", path, e))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    canvas
        .write_with_encoder(encoder)
        .map_err(|e| PipelineError::Compose(format!("{}: {e}", path.display())))
}

pub fn remove_sheets(sheets: &[PackedSheet]) {
    for sheet in sheets {
        if let Err(e) = fs::remove_file(&sheet.path) {
            debug!("Could not remove {}: {}", sheet.path.display(), e);
        }
    }
}

use super::error::PipelineError;
use super::sprite::{SheetLayout, sheet_file_name};
use std::fmt::Write as _;
use std::path::Path;

pub const HEADER: &str = "WEBVTT";

pub struct CueSpec<'a> {
    pub frames: usize,
    pub interval: f64,
    pub layout: SheetLayout,
    /// Prefix sheet paths get inside the cue file, e.g. `sprites`.
    pub web_base: &'a str,
}

/// `HH:MM:SS.mmm`. Hours keep counting past 99.
pub fn format_timestamp(millis: u64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1000) % 60;
    let ms = millis % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{ms:03}")
}

/// Cue boundaries are computed per frame from the index, so rounding never
/// accumulates over long videos.
fn boundary_millis(frame: usize, interval: f64) -> u64 {
    (frame as f64 * interval * 1000.0).round() as u64
}

pub fn sheet_reference(web_base: &str, sheet: usize) -> String {
    let base = web_base.trim_end_matches('/');
    if base.is_empty() {
        sheet_file_name(sheet)
    } else {
        format!("{base}/{}", sheet_file_name(sheet))
    }
}

pub fn render_cues(spec: &CueSpec<'_>) -> String {
    let CueSpec {
        frames,
        interval,
        layout,
        web_base,
    } = *spec;

    let mut out = String::with_capacity(16 + frames * 80);
    out.push_str(HEADER);
    out.push_str("\n\n");

    for i in 0..frames {
        let start = format_timestamp(boundary_millis(i, interval));
        let end = format_timestamp(boundary_millis(i + 1, interval));
        let (x, y) = layout.cell_origin(i);
        let sheet = sheet_reference(web_base, layout.sheet_of(i));
        // writing into a String cannot fail
        let _ = write!(
            out,
            "{start} --> {end}\n{sheet}#xywh={x},{y},{},{}\n\n",
            layout.tile_w, layout.tile_h
        );
    }

    out
}

pub async fn write_cues(path: &Path, spec: &CueSpec<'_>) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::io("failed to create", parent, e))?;
    }
    tokio::fs::write(path, render_cues(spec))
        .await
        .map_err(|e| PipelineError::io("failed to write cue file", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: SheetLayout = SheetLayout {
        tile_w: 160,
        tile_h: 90,
        cols: 10,
        rows: 10,
    };

    fn blocks(text: &str) -> Vec<(String, String)> {
        text.strip_prefix("WEBVTT\n\n")
            .unwrap()
            .split("\n\n")
            .filter(|b| !b.is_empty())
            .map(|b| {
                let (time, reference) = b.split_once('\n').unwrap();
                (time.to_string(), reference.to_string())
            })
            .collect()
    }

    #[test]
    fn timestamps_are_zero_padded() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(7_200), "00:00:07.200");
        assert_eq!(format_timestamp(3_723_004), "01:02:03.004");
        assert_eq!(format_timestamp(360_000_000), "100:00:00.000");
    }

    #[test]
    fn one_cue_per_frame_with_regions() {
        let text = render_cues(&CueSpec {
            frames: 300,
            interval: 2.0,
            layout: GRID,
            web_base: "sprites",
        });
        let cues = blocks(&text);
        assert_eq!(cues.len(), 300);

        assert_eq!(cues[0].0, "00:00:00.000 --> 00:00:02.000");
        assert_eq!(cues[0].1, "sprites/sprite_0001.jpg#xywh=0,0,160,90");

        assert_eq!(cues[11].0, "00:00:22.000 --> 00:00:24.000");
        assert_eq!(cues[11].1, "sprites/sprite_0001.jpg#xywh=160,90,160,90");

        assert_eq!(cues[100].1, "sprites/sprite_0002.jpg#xywh=0,0,160,90");
        assert_eq!(cues[299].0, "00:09:58.000 --> 00:10:00.000");
        assert_eq!(cues[299].1, "sprites/sprite_0003.jpg#xywh=1440,810,160,90");
    }

    #[test]
    fn cue_boundaries_follow_index_formula() {
        let layout = SheetLayout {
            tile_w: 16,
            tile_h: 9,
            cols: 3,
            rows: 2,
        };
        let interval = 7.2;
        let cues = blocks(&render_cues(&CueSpec {
            frames: 20,
            interval,
            layout,
            web_base: "",
        }));

        for (i, (time, reference)) in cues.iter().enumerate() {
            let start = format_timestamp((i as f64 * interval * 1000.0).round() as u64);
            let end = format_timestamp(((i + 1) as f64 * interval * 1000.0).round() as u64);
            assert_eq!(time, &format!("{start} --> {end}"));

            let cell = i % 6;
            let expected = format!(
                "sprite_{:04}.jpg#xywh={},{},16,9",
                i / 6 + 1,
                (cell % 3) * 16,
                (cell / 3) * 9
            );
            assert_eq!(reference, &expected);
        }
        // adjacent cues share their boundary
        assert_eq!(cues[12].0, "00:01:26.400 --> 00:01:33.600");
    }

    #[test]
    fn web_base_trailing_slash_is_ignored() {
        assert_eq!(sheet_reference("thumbs/", 2), "thumbs/sprite_0002.jpg");
        assert_eq!(sheet_reference("", 1), "sprite_0001.jpg");
    }

    #[tokio::test]
    async fn writes_file_creating_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprites").join("thumbs.vtt");
        write_cues(
            &path,
            &CueSpec {
                frames: 2,
                interval: 1.0,
                layout: GRID,
                web_base: "sprites",
            },
        )
        .await
        .unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "WEBVTT\n\n\
             00:00:00.000 --> 00:00:01.000\nsprites/sprite_0001.jpg#xywh=0,0,160,90\n\n\
             00:00:01.000 --> 00:00:02.000\nsprites/sprite_0001.jpg#xywh=160,0,160,90\n\n"
        );
    }
}

//! Canonical encoding parameters and ffmpeg argument builders.
//!
//! Every normalized and composited segment is encoded with the same
//! [`CANONICAL`] parameters. The final concatenation is a stream copy, which
//! is only valid when all segments share codec, resolution, frame rate and
//! audio layout, so none of these values are configurable per pair.
//!
//! - **ffmpeg_args**: builds complete argument vectors for each operation
//! - **concat_list**: renders the concat demuxer list file with escaping

mod concat_list;
mod ffmpeg_args;

pub use concat_list::{escape_list_path, ConcatList};
pub use ffmpeg_args::{FfmpegJob, FfmpegOperation};

/// Fixed encoding parameters shared by every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalParams {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: &'static str,
    pub crf: u32,
    pub preset: &'static str,
    pub pixel_format: &'static str,
    pub audio_codec: &'static str,
    pub audio_bitrate: &'static str,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
}

/// The one parameter set used for normalize and composite.
pub const CANONICAL: CanonicalParams = CanonicalParams {
    width: 1280,
    height: 720,
    fps: 60,
    video_codec: "libx264",
    crf: 23,
    preset: "veryfast",
    pixel_format: "yuv420p",
    audio_codec: "aac",
    audio_bitrate: "192k",
    audio_sample_rate: 44100,
    audio_channels: 2,
};

/// Where and how large the overlay image is drawn.
///
/// Constants, not per-pair options, so every segment of a batch looks the
/// same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPolicy {
    /// Target width of the overlay; height follows the aspect ratio.
    pub footer_width: u32,
    /// Gap between the overlay and the bottom edge, in pixels.
    pub bottom_inset: u32,
}

pub const OVERLAY: OverlayPolicy = OverlayPolicy {
    footer_width: 1235,
    bottom_inset: 0,
};

impl OverlayPolicy {
    /// Filter graph: scale the image (input 1), then centre it on the
    /// bottom edge of the video (input 0) for the whole duration.
    pub fn filter_graph(&self) -> String {
        format!(
            "[1:v]scale={w}:-1[ovl];[0:v][ovl]overlay=x=(W-w)/2:y=H-h-{inset}:eof_action=repeat,format={pix}[vout]",
            w = self.footer_width,
            inset = self.bottom_inset,
            pix = CANONICAL.pixel_format,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_graph_scales_then_anchors_bottom() {
        let graph = OVERLAY.filter_graph();
        assert!(graph.starts_with("[1:v]scale=1235:-1[ovl]"));
        assert!(graph.contains("overlay=x=(W-w)/2:y=H-h-0"));
        assert!(graph.ends_with("[vout]"));
    }

    #[test]
    fn footer_fits_canonical_frame() {
        assert!(OVERLAY.footer_width <= CANONICAL.width);
    }
}

//! ffmpeg command options builder.
//!
//! Produces the full argument vector (everything after the program name)
//! for the three ffmpeg operations the pipeline uses. Call sites never
//! assemble arguments themselves.

use std::path::{Path, PathBuf};

use super::{CanonicalParams, CANONICAL, OVERLAY};

/// Which ffmpeg operation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfmpegOperation {
    /// Re-encode a source video to canonical parameters.
    Normalize,
    /// Overlay an image onto a normalized video, canonical parameters.
    Composite,
    /// Stream-copy concatenation from a list file.
    Concat,
}

impl std::fmt::Display for FfmpegOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FfmpegOperation::Normalize => write!(f, "normalize"),
            FfmpegOperation::Composite => write!(f, "composite"),
            FfmpegOperation::Concat => write!(f, "concat"),
        }
    }
}

/// A fully described ffmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegJob {
    operation: FfmpegOperation,
    inputs: Vec<PathBuf>,
    output: PathBuf,
    args: Vec<String>,
}

impl FfmpegJob {
    /// `src` re-encoded to 1280x720@60, H.264 + AAC stereo.
    pub fn normalize(src: &Path, dst: &Path) -> Self {
        let mut args = preamble();
        push_input(&mut args, src);

        args.push("-vf".to_string());
        args.push(format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
            w = CANONICAL.width,
            h = CANONICAL.height,
            fps = CANONICAL.fps,
        ));
        push_canonical_codecs(&mut args, &CANONICAL);
        push_output(&mut args, dst);

        Self {
            operation: FfmpegOperation::Normalize,
            inputs: vec![src.to_path_buf()],
            output: dst.to_path_buf(),
            args,
        }
    }

    /// Overlay `image` onto `video` and re-encode with canonical parameters.
    pub fn composite(video: &Path, image: &Path, dst: &Path) -> Self {
        let mut args = preamble();
        push_input(&mut args, video);
        push_input(&mut args, image);

        args.push("-filter_complex".to_string());
        args.push(OVERLAY.filter_graph());
        args.push("-map".to_string());
        args.push("[vout]".to_string());
        args.push("-map".to_string());
        args.push("0:a?".to_string());
        push_canonical_codecs(&mut args, &CANONICAL);
        push_output(&mut args, dst);

        Self {
            operation: FfmpegOperation::Composite,
            inputs: vec![video.to_path_buf(), image.to_path_buf()],
            output: dst.to_path_buf(),
            args,
        }
    }

    /// Concatenate the segments listed in `list_file` without re-encoding.
    pub fn concat(list_file: &Path, dst: &Path) -> Self {
        let mut args = preamble();
        args.push("-f".to_string());
        args.push("concat".to_string());
        args.push("-safe".to_string());
        args.push("0".to_string());
        push_input(&mut args, list_file);
        args.push("-c".to_string());
        args.push("copy".to_string());
        push_output(&mut args, dst);

        Self {
            operation: FfmpegOperation::Concat,
            inputs: vec![list_file.to_path_buf()],
            output: dst.to_path_buf(),
            args,
        }
    }

    pub fn operation(&self) -> FfmpegOperation {
        self.operation
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Argument vector, excluding the program name.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Overwrite without prompting, never read stdin, quiet banner.
fn preamble() -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-y".to_string(),
    ]
}

fn push_input(args: &mut Vec<String>, path: &Path) {
    args.push("-i".to_string());
    args.push(path.to_string_lossy().to_string());
}

fn push_output(args: &mut Vec<String>, path: &Path) {
    args.push(path.to_string_lossy().to_string());
}

fn push_canonical_codecs(args: &mut Vec<String>, params: &CanonicalParams) {
    let pairs: [(&str, String); 10] = [
        ("-r", params.fps.to_string()),
        ("-c:v", params.video_codec.to_string()),
        ("-preset", params.preset.to_string()),
        ("-crf", params.crf.to_string()),
        ("-pix_fmt", params.pixel_format.to_string()),
        ("-c:a", params.audio_codec.to_string()),
        ("-b:a", params.audio_bitrate.to_string()),
        ("-ar", params.audio_sample_rate.to_string()),
        ("-ac", params.audio_channels.to_string()),
        ("-movflags", "+faststart".to_string()),
    ];
    for (flag, value) in pairs {
        args.push(flag.to_string());
        args.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn normalize_uses_canonical_parameters() {
        let job = FfmpegJob::normalize(Path::new("/t/raw.mov"), Path::new("/t/norm.mp4"));
        let args = job.args();

        assert_eq!(value_after(args, "-i"), Some("/t/raw.mov"));
        assert_eq!(value_after(args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(args, "-preset"), Some("veryfast"));
        assert_eq!(value_after(args, "-crf"), Some("23"));
        assert_eq!(value_after(args, "-r"), Some("60"));
        assert_eq!(value_after(args, "-c:a"), Some("aac"));
        assert_eq!(value_after(args, "-b:a"), Some("192k"));
        assert_eq!(value_after(args, "-ar"), Some("44100"));
        assert_eq!(value_after(args, "-ac"), Some("2"));
        assert!(value_after(args, "-vf").unwrap().contains("scale=1280:720"));
        assert_eq!(args.last().map(String::as_str), Some("/t/norm.mp4"));
        assert!(args.contains(&"-y".to_string()));
    }

    #[test]
    fn composite_shares_codec_tail_with_normalize() {
        let norm = FfmpegJob::normalize(Path::new("a"), Path::new("out.mp4"));
        let comp = FfmpegJob::composite(Path::new("v"), Path::new("i.png"), Path::new("out.mp4"));

        // Codec/rate options and output are identical: segments stay concat-compatible.
        let tail = |args: &[String]| args[args.len() - 21..].to_vec();
        assert_eq!(tail(norm.args()), tail(comp.args()));
        assert_eq!(comp.inputs().len(), 2);
        assert!(value_after(comp.args(), "-filter_complex")
            .unwrap()
            .contains("scale=1235:-1"));
    }

    #[test]
    fn concat_is_stream_copy() {
        let job = FfmpegJob::concat(Path::new("/t/list.txt"), Path::new("/t/joined.mp4"));
        let args = job.args();
        assert_eq!(value_after(args, "-f"), Some("concat"));
        assert_eq!(value_after(args, "-safe"), Some("0"));
        assert_eq!(value_after(args, "-c"), Some("copy"));
        assert!(value_after(args, "-c:v").is_none());
        assert_eq!(job.operation(), FfmpegOperation::Concat);
    }
}

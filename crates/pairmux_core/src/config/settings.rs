//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//!
//! Encoding parameters are deliberately absent: every segment must share the
//! canonical parameters in [`crate::encode`] for stream-copy concatenation.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Staging, output and log directories.
    #[serde(default)]
    pub paths: PathSettings,

    /// Remote object store access (rclone).
    #[serde(default)]
    pub remote: RemoteSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Post-download checks.
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Batch scheduling.
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for staging, output, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder for per-pair staging files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for composited segments and the published artifact.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for run logs.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// File name of the published artifact inside `output_folder`.
    #[serde(default = "default_published_name")]
    pub published_name: String,
}

fn default_temp_root() -> String {
    "temp".to_string()
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_published_name() -> String {
    "final.mp4".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
            published_name: default_published_name(),
        }
    }
}

/// Remote fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// rclone executable.
    #[serde(default = "default_rclone")]
    pub rclone_binary: String,

    /// Name of the configured rclone remote (without the trailing colon).
    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    /// Path to rclone.conf. Empty uses rclone's own default lookup.
    #[serde(default)]
    pub config_path: String,
}

fn default_rclone() -> String {
    "rclone".to_string()
}

fn default_remote_name() -> String {
    "remote".to_string()
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            rclone_binary: default_rclone(),
            remote_name: default_remote_name(),
            config_path: String::new(),
        }
    }
}

/// External tool paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable used for normalize, composite and concat.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_binary: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg(),
        }
    }
}

/// Checks applied to freshly downloaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Files smaller than this are treated as corrupt.
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: u64,

    /// Check PNG/JPEG magic bytes on downloaded images.
    #[serde(default = "default_true")]
    pub verify_image_signature: bool,
}

fn default_min_size_bytes() -> u64 {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_size_bytes: default_min_size_bytes(),
            verify_image_signature: true,
        }
    }
}

/// Batch scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Number of pairs processed concurrently. 1 means strictly sequential.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Keep raw and normalized files after a pair succeeds.
    #[serde(default)]
    pub keep_intermediates: bool,

    /// Write `batch_report.json` next to the published artifact.
    #[serde(default = "default_true")]
    pub write_report: bool,
}

fn default_workers() -> usize {
    1
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            keep_intermediates: false,
            write_report: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Only keep external tool output in the tail buffer.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Log every external command line before running it.
    #[serde(default = "default_true")]
    pub show_commands: bool,
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_commands: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Remote,
    Tools,
    Validation,
    Pipeline,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Remote,
        ConfigSection::Tools,
        ConfigSection::Validation,
        ConfigSection::Pipeline,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Remote => "remote",
            ConfigSection::Tools => "tools",
            ConfigSection::Validation => "validation",
            ConfigSection::Pipeline => "pipeline",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in a generated file.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Staging, output and log directories",
            ConfigSection::Remote => "Remote object store (rclone)",
            ConfigSection::Tools => "External tools",
            ConfigSection::Validation => "Checks on downloaded files",
            ConfigSection::Pipeline => "Batch scheduling",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

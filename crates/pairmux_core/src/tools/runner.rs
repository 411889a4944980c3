//! Process-backed implementation of [`MediaTools`].

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Settings;
use crate::encode::FfmpegJob;
use crate::logging::ScopedLogger;

use super::{MediaTools, ToolError, ToolResult};

/// Captured result of one process run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, used as the short failure message.
    pub fn last_error_line(&self) -> String {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no error output")
            .to_string()
    }
}

/// Runs rclone and ffmpeg as child processes.
#[derive(Debug, Clone)]
pub struct ProcessTools {
    rclone: String,
    remote_name: String,
    rclone_config: Option<PathBuf>,
    ffmpeg: String,
}

impl ProcessTools {
    pub fn new(rclone: impl Into<String>, remote_name: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        Self {
            rclone: rclone.into(),
            remote_name: remote_name.into(),
            rclone_config: None,
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Set an explicit rclone.conf.
    pub fn with_rclone_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.rclone_config = Some(path.into());
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let tools = Self::new(
            &settings.remote.rclone_binary,
            &settings.remote.remote_name,
            &settings.tools.ffmpeg_binary,
        );
        if settings.remote.config_path.trim().is_empty() {
            tools
        } else {
            tools.with_rclone_config(&settings.remote.config_path)
        }
    }

    /// `remote:ref` source spec for rclone.
    fn remote_spec(&self, remote_ref: &str) -> String {
        format!(
            "{}:{}",
            self.remote_name.trim_end_matches(':'),
            remote_ref.trim_start_matches('/')
        )
    }

    fn rclone_args(&self, remote_ref: &str, landing_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "copy".to_string(),
            self.remote_spec(remote_ref),
            landing_dir.to_string_lossy().to_string(),
        ];
        if let Some(ref config) = self.rclone_config {
            args.push("--config".to_string());
            args.push(config.to_string_lossy().to_string());
        }
        args
    }

    /// Run a program to completion, feeding its output to the logger.
    fn run(&self, program: &str, args: &[String], log: &ScopedLogger) -> ToolResult<ToolOutput> {
        log.command(&format!("{} {}", program, args.join(" ")));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                tool: program.to_string(),
                source,
            })?;

        let result = ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        for line in result.stdout.lines() {
            log.output_line(line, false);
        }
        for line in result.stderr.lines() {
            log.output_line(line, true);
        }

        if !result.success() {
            log.show_tail(program);
            return Err(ToolError::non_zero_exit(
                program,
                result.exit_code,
                result.last_error_line(),
            ));
        }

        Ok(result)
    }

    fn run_ffmpeg(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()> {
        tracing::debug!("ffmpeg {} -> {}", job.operation(), job.output().display());
        self.run(&self.ffmpeg, job.args(), log).map(|_| ())
    }
}

impl MediaTools for ProcessTools {
    fn remote_copy(
        &self,
        remote_ref: &str,
        landing_dir: &Path,
        log: &ScopedLogger,
    ) -> ToolResult<()> {
        let args = self.rclone_args(remote_ref, landing_dir);
        self.run(&self.rclone, &args, log).map(|_| ())
    }

    fn transcode(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()> {
        self.run_ffmpeg(job, log)
    }

    fn composite(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()> {
        self.run_ffmpeg(job, log)
    }

    fn concat(&self, job: &FfmpegJob, log: &ScopedLogger) -> ToolResult<()> {
        self.run_ffmpeg(job, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogConfig, RunLogger};
    use std::sync::Arc;

    #[test]
    fn rclone_args_include_remote_and_config() {
        let tools = ProcessTools::new("rclone", "meudrive:", "ffmpeg")
            .with_rclone_config("/home/u/.config/rclone/rclone.conf");
        let args = tools.rclone_args("/clips/a.mp4", Path::new("/tmp/land"));
        assert_eq!(
            args,
            vec![
                "copy",
                "meudrive:clips/a.mp4",
                "/tmp/land",
                "--config",
                "/home/u/.config/rclone/rclone.conf",
            ]
        );
    }

    #[test]
    fn from_settings_skips_empty_config() {
        let settings = Settings::default();
        let tools = ProcessTools::from_settings(&settings);
        assert!(tools.rclone_config.is_none());
        assert_eq!(tools.ffmpeg, "ffmpeg");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let logger = Arc::new(RunLogger::detached("t", LogConfig::default()));
        let log = logger.scope("p");
        let tools = ProcessTools::new("rclone", "r", "ffmpeg");
        let err = tools
            .run("definitely-not-a-real-binary-pairmux", &[], &log)
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[test]
    fn last_error_line_skips_blank_lines() {
        let out = ToolOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: "first\nreal problem\n\n".to_string(),
        };
        assert_eq!(out.last_error_line(), "real problem");
    }
}

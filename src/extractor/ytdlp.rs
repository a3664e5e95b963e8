// yt-dlp gateway - invokes the external binary and parses its JSON output

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use super::errors::ExtractError;
use super::models::{DirectLink, RawFormat, RawMediaInfo};
use super::traits::MediaExtractor;

/// Gateway backed by the `yt-dlp` binary.
///
/// Each call spawns one process and blocks until it exits; network stalls are
/// bounded by yt-dlp's own `--socket-timeout`.
pub struct YtDlpExtractor {
    binary: String,
    socket_timeout: u32,
}

impl YtDlpExtractor {
    pub fn new(socket_timeout: u32) -> Self {
        Self {
            binary: Self::find_ytdlp(),
            socket_timeout,
        }
    }

    /// Find yt-dlp binary in common paths, then via `which`, then hope for PATH.
    fn find_ytdlp() -> String {
        let common_paths = [
            "/usr/local/bin/yt-dlp",
            "/usr/bin/yt-dlp",
            "/opt/homebrew/bin/yt-dlp",
        ];

        for path in common_paths {
            if Path::new(path).exists() {
                return path.to_string();
            }
        }

        if let Ok(output) = Command::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                if let Ok(path) = String::from_utf8(output.stdout) {
                    let trimmed = path.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }

        "yt-dlp".to_string()
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout.to_string(),
        ]
    }

    fn run(&self, args: Vec<String>) -> Result<Vec<u8>, ExtractError> {
        debug!("running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| {
                ExtractError::ToolNotFound(format!("failed to start {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Failed(stderr.trim().to_string()));
        }

        Ok(output.stdout)
    }

    fn parse_json(stdout: &[u8]) -> Result<Value, ExtractError> {
        let json_str = String::from_utf8_lossy(stdout);
        serde_json::from_str(&json_str)
            .map_err(|e| ExtractError::Parse(format!("invalid JSON from yt-dlp: {}", e)))
    }

    fn parse_media_info(json: &Value) -> RawMediaInfo {
        let formats = json["formats"]
            .as_array()
            .map(|fmts| fmts.iter().map(parse_format).collect())
            .unwrap_or_default();

        RawMediaInfo {
            id: json["id"].as_str().unwrap_or("").to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
            duration: json["duration"].as_f64().unwrap_or(0.0) as u64,
            formats,
        }
    }
}

/// Parse one rendition object. Fields of unexpected type degrade to absent.
fn parse_format(f: &Value) -> RawFormat {
    RawFormat {
        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
        ext: f["ext"].as_str().unwrap_or("").to_string(),
        resolution: f["resolution"].as_str().map(|s| s.to_string()),
        height: f["height"].as_u64().map(|h| h as u32),
        filesize: f["filesize"].as_u64(),
        filesize_approx: f["filesize_approx"].as_u64(),
        format_note: f["format_note"].as_str().map(|s| s.to_string()),
        vcodec: f["vcodec"].as_str().map(|s| s.to_string()),
        acodec: f["acodec"].as_str().map(|s| s.to_string()),
    }
}

impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn describe(&self, url: &str) -> Result<RawMediaInfo, ExtractError> {
        let mut args = self.base_args();
        args.push("--dump-json".to_string());
        args.push(url.to_string());

        let stdout = self.run(args)?;
        let json = Self::parse_json(&stdout)?;
        Ok(Self::parse_media_info(&json))
    }

    fn resolve_direct(&self, url: &str, format_id: &str) -> Result<DirectLink, ExtractError> {
        let mut args = self.base_args();
        args.push("-f".to_string());
        args.push(format_id.to_string());
        args.push("--dump-json".to_string());
        args.push(url.to_string());

        let stdout = self.run(args)?;
        let json = Self::parse_json(&stdout)?;

        Ok(DirectLink {
            url: json["url"].as_str().map(|s| s.to_string()),
            title: json["title"].as_str().unwrap_or("video").to_string(),
            ext: json["ext"].as_str().unwrap_or("mp4").to_string(),
        })
    }

    fn materialize(
        &self,
        url: &str,
        format_id: &str,
        output_template: &Path,
    ) -> Result<PathBuf, ExtractError> {
        let mut args = self.base_args();
        args.push("-f".to_string());
        args.push(format_id.to_string());
        args.push("-o".to_string());
        args.push(output_template.to_string_lossy().into_owned());
        args.push("--no-simulate".to_string());
        args.push("--print".to_string());
        args.push("after_move:filepath".to_string());
        args.push(url.to_string());

        let stdout = self.run(args)?;
        let printed = String::from_utf8_lossy(&stdout);
        printed
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ExtractError::Parse("yt-dlp did not report a final file path".to_string())
            })
    }
}

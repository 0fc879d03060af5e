//! External media tools: ffprobe for dimensions, ffmpeg for compositing,
//! yt-dlp for metadata and downloads.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::{RenderError, RenderResult};
use crate::planner::PlacementPlan;

pub trait MediaProbe {
    /// Width and height of the first video stream.
    fn dimensions(&self, video: &Path) -> RenderResult<(u32, u32)>;
}

/// Source of remote videos.
pub trait MediaFetch {
    fn probe(&self, url: &str) -> RenderResult<VideoInfo>;

    /// Materialize `url` as `<dest_stem>.<ext>` and return the written path.
    fn fetch(&self, url: &str, dest_stem: &Path, range: Option<TimeRange>) -> RenderResult<PathBuf>;
}

pub trait Compositor {
    /// Stack background, scaled video and overlay per `plan` into `output`.
    fn composite(&self, source: &Path, plan: &PlacementPlan, output: &Path) -> RenderResult<()>;
}

impl<T: MediaProbe + ?Sized> MediaProbe for &T {
    fn dimensions(&self, video: &Path) -> RenderResult<(u32, u32)> {
        (**self).dimensions(video)
    }
}

impl<T: Compositor + ?Sized> Compositor for &T {
    fn composite(&self, source: &Path, plan: &PlacementPlan, output: &Path) -> RenderResult<()> {
        (**self).composite(source, plan, output)
    }
}

/// ffprobe / ffmpeg found on `PATH` (or at explicit locations).
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Ffmpeg {
    /// Full argument list for a composite run.
    pub fn composite_args(source: &Path, plan: &PlacementPlan, output: &Path) -> Vec<String> {
        let path = |p: &Path| p.to_string_lossy().into_owned();
        let mut args: Vec<String> = vec!["-y".into(), "-i".into(), path(source)];
        for still in [&plan.background, &plan.overlay] {
            args.extend(["-loop", "1", "-i"].map(String::from));
            args.push(path(still));
        }
        args.push("-filter_complex".into());
        args.push(plan.filter_graph());
        args.extend(
            [
                "-map", "[vout]", "-map", "0:a?", "-c:v", "libx264", "-preset", "fast", "-crf",
                "23", "-c:a", "aac", "-shortest",
            ]
            .map(String::from),
        );
        args.push(path(output));
        args
    }
}

pub fn parse_dimensions(stdout: &str) -> Option<(u32, u32)> {
    let line = stdout.lines().find(|l| !l.trim().is_empty())?;
    let mut parts = line.trim().split(',');
    let width = parts.next()?.trim().parse().ok()?;
    let height = parts.next()?.trim().parse().ok()?;
    Some((width, height))
}

impl MediaProbe for Ffmpeg {
    fn dimensions(&self, video: &Path) -> RenderResult<(u32, u32)> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=p=0",
            ])
            .arg(video)
            .output()
            .map_err(|e| RenderError::probe(video, format!("failed to run ffprobe: {e}")))?;
        if !output.status.success() {
            return Err(RenderError::probe(
                video,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let dims = parse_dimensions(&stdout)
            .ok_or_else(|| RenderError::probe(video, "no video stream found"))?;
        debug!("Probed {}: {}x{}", video.display(), dims.0, dims.1);
        Ok(dims)
    }
}

impl Compositor for Ffmpeg {
    fn composite(&self, source: &Path, plan: &PlacementPlan, output: &Path) -> RenderResult<()> {
        let args = Self::composite_args(source, plan, output);
        debug!("ffmpeg {}", args.join(" "));
        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .map_err(|e| RenderError::Compositing {
                stderr: format!("failed to run ffmpeg: {e}"),
            })?;
        if !result.status.success() {
            error!("ffmpeg failed to produce {}", output.display());
            return Err(RenderError::Compositing {
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        info!("Composited video written to {}", output.display());
        Ok(())
    }
}

/// Metadata shown before downloading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "seconds")]
    pub duration: u64,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

impl VideoInfo {
    pub fn channel_name(&self) -> Option<&str> {
        self.channel.as_deref().or(self.uploader.as_deref())
    }
}

fn seconds<'de, D: serde::Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    let value: Option<f64> = Option::deserialize(de)?;
    Ok(value.map(|v| v.max(0.0) as u64).unwrap_or(0))
}

/// Inclusive trim range in whole seconds; `end` of `None` means to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl TimeRange {
    /// A range only when it actually trims something.
    pub fn new(start: Option<u32>, end: Option<u32>) -> Option<Self> {
        let start = start.unwrap_or(0);
        if start > 0 || end.is_some() {
            Some(Self { start, end })
        } else {
            None
        }
    }

    fn section(&self) -> String {
        match self.end {
            Some(end) => format!("*{}-{}", self.start, end),
            None => format!("*{}-inf", self.start),
        }
    }
}

const FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// yt-dlp command line wrapper.
#[derive(Debug, Clone)]
pub struct YtDlp {
    pub program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
        }
    }
}

impl MediaFetch for YtDlp {
    fn probe(&self, url: &str) -> RenderResult<VideoInfo> {
        info!("Fetching metadata for {}", url);
        let output = Command::new(&self.program)
            .args(["--dump-single-json", "--no-playlist", "--skip-download", url])
            .output()
            .map_err(|e| RenderError::fetch(format!("failed to run yt-dlp: {e}")))?;
        if !output.status.success() {
            return Err(RenderError::fetch(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| RenderError::fetch(format!("unreadable metadata for {url}: {e}")))
    }

    fn fetch(&self, url: &str, dest_stem: &Path, range: Option<TimeRange>) -> RenderResult<PathBuf> {
        let template = format!("{}.%(ext)s", dest_stem.to_string_lossy());
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--no-playlist",
            "-f",
            FORMAT_SELECTOR,
            "--merge-output-format",
            "mp4",
            "-o",
            template.as_str(),
            "--print",
            "after_move:filepath",
        ]);
        if let Some(range) = range {
            let section = range.section();
            info!("Restricting download to {}", section);
            cmd.args(["--download-sections", section.as_str(), "--force-keyframes-at-cuts"]);
        }
        cmd.arg(url);

        info!("Downloading {}", url);
        let output = cmd
            .output()
            .map_err(|e| RenderError::fetch(format!("failed to run yt-dlp: {e}")))?;
        if !output.status.success() {
            error!("yt-dlp failed for {}", url);
            return Err(RenderError::fetch(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let printed = String::from_utf8_lossy(&output.stdout);
        if let Some(path) = printed
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(PathBuf::from)
            .filter(|p| p.exists())
        {
            return Ok(path);
        }
        files_with_stem(dest_stem)
            .into_iter()
            .find(|p| p.extension().is_none_or(|ext| ext != "part"))
            .ok_or_else(|| RenderError::fetch(format!("download of {url} produced no file")))
    }
}

/// Files in `stem`'s directory whose names start with its file name,
/// including yt-dlp's `.part` and per-format leftovers.
pub fn files_with_stem(stem: &Path) -> Vec<PathBuf> {
    let dir = stem.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let Some(prefix) = stem.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

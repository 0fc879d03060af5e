//! One render job: probe, overlay, background, composite, cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::background::write_gradient_background;
use crate::color::{GradientDirection, Rgb, hex_to_rgb};
use crate::config::{Canvas, TemplateStyle};
use crate::error::RenderResult;
use crate::fonts::FontSet;
use crate::markup::TextBlock;
use crate::media::{Compositor, MediaFetch, MediaProbe, TimeRange, files_with_stem};
use crate::overlay::{OverlayContent, OverlaySpec, Platform, write_overlay};
use crate::planner::{CropSpec, PlacementPlan, VideoArea, VideoGeometry};

/// Caller-supplied template parameters, independent of the source video.
#[derive(Debug, Clone)]
pub struct TemplateInput {
    pub title: String,
    pub body: String,
    pub username: String,
    pub platform: Platform,
    pub color1: String,
    pub color2: String,
    pub background_image: Option<PathBuf>,
    pub gradient: GradientDirection,
    pub crop: Option<CropSpec>,
    pub style: TemplateStyle,
}

impl Default for TemplateInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            username: String::new(),
            platform: Platform::default(),
            color1: "#1A1A2E".to_string(),
            color2: "#E94560".to_string(),
            background_image: None,
            gradient: GradientDirection::default(),
            crop: None,
            style: TemplateStyle::default(),
        }
    }
}

impl TemplateInput {
    /// Whether there is anything to draw over the video.
    pub fn has_content(&self) -> bool {
        [&self.title, &self.body, &self.username]
            .iter()
            .any(|s| !s.trim().is_empty())
    }
}

/// Remove `path`, treating an absent file as already removed.
pub fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Files a job creates. Temporaries are always removed on drop; the output
/// only survives if the job was marked complete.
struct JobFiles {
    temporaries: Vec<PathBuf>,
    output: PathBuf,
    complete: bool,
}

impl JobFiles {
    fn new(output: &Path) -> Self {
        Self {
            temporaries: Vec::new(),
            output: output.to_path_buf(),
            complete: false,
        }
    }

    /// Register a temporary sibling of the output named `<stem>_<suffix>`.
    fn temporary(&mut self, suffix: &str) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "render".to_string());
        let path = self.output.with_file_name(format!("{stem}_{suffix}"));
        self.temporaries.push(path.clone());
        path
    }
}

impl Drop for JobFiles {
    fn drop(&mut self) {
        for path in &self.temporaries {
            remove_if_exists(path);
        }
        if !self.complete {
            remove_if_exists(&self.output);
        }
    }
}

/// Renders templates onto local video files through a probe and a
/// compositing engine.
pub struct TemplateRenderer<P, C> {
    canvas: Canvas,
    fonts: FontSet,
    logo: Option<PathBuf>,
    probe: P,
    compositor: C,
}

impl<P: MediaProbe, C: Compositor> TemplateRenderer<P, C> {
    pub fn new(canvas: Canvas, fonts: FontSet, logo: Option<PathBuf>, probe: P, compositor: C) -> Self {
        Self {
            canvas,
            fonts,
            logo,
            probe,
            compositor,
        }
    }

    /// Compose `source` with the template into `output`.
    ///
    /// On any failure the overlay, the generated background and the partial
    /// output are removed before the error is returned. A user-supplied
    /// background image is never removed.
    pub fn render_template(
        &self,
        source: &Path,
        input: &TemplateInput,
        output: &Path,
    ) -> RenderResult<PathBuf> {
        let mut files = JobFiles::new(output);
        match self.run(source, input, output, &mut files) {
            Ok(()) => {
                files.complete = true;
                info!("Rendered {}", output.display());
                Ok(output.to_path_buf())
            }
            Err(e) => {
                error!("Render of {} failed at {}: {}", source.display(), e.stage(), e);
                Err(e)
            }
        }
    }

    fn run(
        &self,
        source: &Path,
        input: &TemplateInput,
        output: &Path,
        files: &mut JobFiles,
    ) -> RenderResult<()> {
        let primary = hex_to_rgb(&input.color1)?;
        let secondary = hex_to_rgb(&input.color2)?;
        if let Some(crop) = &input.crop {
            crop.validate()?;
        }

        let (src_w, src_h) = self.probe.dimensions(source)?;
        info!("Source {} is {}x{}", source.display(), src_w, src_h);

        let text = TextBlock::from_raw(&input.title, &input.body);
        let spec = OverlaySpec {
            style: input.style,
            content: OverlayContent {
                text: &text,
                username: &input.username,
                platform: input.platform,
            },
            primary,
            secondary,
        };
        let overlay = files.temporary("overlay.png");
        write_overlay(&self.fonts, self.canvas, self.logo.as_deref(), &spec, &overlay)?;

        let background = match input.background_image.as_deref().filter(|p| p.exists()) {
            Some(user) => {
                info!("Using background image {}", user.display());
                user.to_path_buf()
            }
            None => {
                let path = files.temporary("bg.png");
                let (c1, c2) = match input.style {
                    TemplateStyle::Card => (primary, secondary),
                    TemplateStyle::Classic => (Rgb::BLACK, Rgb::BLACK),
                };
                write_gradient_background(c1, c2, input.gradient, self.canvas, &path)?;
                path
            }
        };

        let area = VideoArea::for_style(input.style, self.canvas);
        let geometry = VideoGeometry::compute(src_w, src_h, input.crop.as_ref(), self.canvas, area)?;
        debug!(
            "Video scaled to {}x{} at ({}, {})",
            geometry.scaled.0, geometry.scaled.1, geometry.offset.0, geometry.offset.1
        );
        let plan = PlacementPlan {
            canvas: self.canvas,
            geometry,
            background,
            overlay,
        };
        self.compositor.composite(source, &plan, output)
    }

    /// Download `url` into `out_dir` and render the template onto it.
    ///
    /// The raw download is `<id>_raw.<ext>`, the result `<id>.mp4`. With no
    /// text and no username the raw file is just renamed. The raw file never
    /// outlives the job, and a failed download leaves no partial files.
    pub fn render_url<F: MediaFetch>(
        &self,
        fetcher: &F,
        url: &str,
        range: Option<TimeRange>,
        input: &TemplateInput,
        out_dir: &Path,
    ) -> RenderResult<PathBuf> {
        fs::create_dir_all(out_dir)?;
        let id = Uuid::new_v4();
        let final_path = out_dir.join(format!("{id}.mp4"));
        let raw_stem = out_dir.join(format!("{id}_raw"));
        let raw = match fetcher.fetch(url, &raw_stem, range) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Download of {} failed: {}", url, e);
                for leftover in files_with_stem(&raw_stem) {
                    remove_if_exists(&leftover);
                }
                return Err(e);
            }
        };
        info!("Downloaded {} to {}", url, raw.display());

        if !input.has_content() {
            info!("No template text, keeping the download as is");
            if let Err(e) = fs::rename(&raw, &final_path) {
                remove_if_exists(&raw);
                return Err(e.into());
            }
            return Ok(final_path);
        }

        let result = self.render_template(&raw, input, &final_path);
        remove_if_exists(&raw);
        result
    }

    /// Render the template onto an existing local file; the input is kept.
    pub fn render_file(&self, input_file: &Path, input: &TemplateInput, out_dir: &Path) -> RenderResult<PathBuf> {
        fs::create_dir_all(out_dir)?;
        let output = out_dir.join(format!("{}.mp4", Uuid::new_v4()));
        self.render_template(input_file, input, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_content_detection() {
        let mut input = TemplateInput::default();
        assert!(!input.has_content());
        input.username = "  ".into();
        assert!(!input.has_content());
        input.username = "alice".into();
        assert!(input.has_content());
    }

    #[test]
    fn job_files_clean_up_unless_complete() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job.mp4");
        let overlay;
        {
            let mut files = JobFiles::new(&output);
            overlay = files.temporary("overlay.png");
            fs::write(&overlay, b"png").unwrap();
            fs::write(&output, b"partial").unwrap();
        }
        assert_eq!(overlay, dir.path().join("job_overlay.png"));
        assert!(!overlay.exists());
        assert!(!output.exists());

        {
            let mut files = JobFiles::new(&output);
            let bg = files.temporary("bg.png");
            fs::write(&bg, b"png").unwrap();
            fs::write(&output, b"done").unwrap();
            files.complete = true;
        }
        assert!(output.exists());
        assert!(!dir.path().join("job_bg.png").exists());
    }

    #[test]
    fn removing_missing_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(&dir.path().join("never-created.png"));
    }
}

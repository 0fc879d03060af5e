use std::path::PathBuf;

pub type RenderResult<T> = Result<T, RenderError>;

/// Everything that can abort a render job.
///
/// Text enhancement failures and missing optional assets (logo, fonts) are
/// not represented here: they are logged and degraded where they happen.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("invalid color '{0}': expected 6 hex digits")]
    InvalidColorFormat(String),

    #[error("invalid crop: {0}")]
    InvalidCrop(String),

    #[error("probe failed for {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    #[error("compositing failed: {stderr}")]
    Compositing { stderr: String },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("image error: {0}")]
    Image(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn probe(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Short name of the pipeline stage that failed, for user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidColorFormat(_) | Self::InvalidCrop(_) => "input",
            Self::Probe { .. } => "probe",
            Self::Compositing { .. } => "compositing",
            Self::Fetch(_) => "fetch",
            Self::Image(_) => "raster",
            Self::Io(_) => "io",
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

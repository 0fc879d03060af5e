pub mod args;
pub mod background;
pub mod color;
pub mod config;
pub mod enhance;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod job;
pub mod layout;
pub mod markup;
pub mod media;
pub mod overlay;
pub mod planner;
pub mod surface;
pub mod utils;

pub use error::{RenderError, RenderResult};

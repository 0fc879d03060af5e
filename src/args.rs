use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::color::GradientDirection;
use crate::config::TemplateStyle;
use crate::job::TemplateInput;
use crate::overlay::Platform;
use crate::planner::CropSpec;
use crate::utils::time_to_seconds;

#[derive(Parser, Debug)]
#[clap(name = "reelcard", version, about = "Turn videos into vertical social templates")]
pub struct Args {
    /// JSON config file; defaults apply when it does not exist.
    #[clap(long, global = true, default_value = "reelcard.json")]
    pub config: PathBuf,

    /// Output directory (overrides the config file).
    #[clap(long, global = true)]
    pub out_dir: Option<PathBuf>,

    #[clap(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show title, duration, channel and thumbnail of a video URL.
    Info { url: String },

    /// Download a video (optionally trimmed) and render the template on it.
    Render {
        #[clap(long)]
        url: String,

        #[clap(long, value_parser = time_to_seconds)]
        start: Option<u32>,

        #[clap(long, value_parser = time_to_seconds)]
        end: Option<u32>,

        #[clap(flatten)]
        template: TemplateArgs,
    },

    /// Render the template on a local video file.
    Compose {
        #[clap(long)]
        input: PathBuf,

        #[clap(flatten)]
        template: TemplateArgs,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateArgs {
    #[clap(long, default_value = "")]
    pub title: String,

    /// Body text; `**phrase**` marks highlighted words.
    #[clap(long, default_value = "")]
    pub text: String,

    #[clap(long, default_value = "")]
    pub username: String,

    #[clap(long, default_value = "instagram")]
    pub platform: String,

    /// Card fill color (hex); falls back to the configured default.
    #[clap(long)]
    pub color1: Option<String>,

    /// Card border color (hex); falls back to the configured default.
    #[clap(long)]
    pub color2: Option<String>,

    /// Background image used instead of a generated gradient.
    #[clap(long)]
    pub background: Option<PathBuf>,

    #[clap(long, default_value = "diagonal-br")]
    pub gradient: String,

    /// Crop as `x,y,w,h` percentages of the source frame.
    #[clap(long)]
    pub crop: Option<CropSpec>,

    /// `card` or `classic`.
    #[clap(long, default_value = "card")]
    pub style: String,

    /// Generate a title and highlights with the text-enhancement service.
    #[clap(long)]
    pub enhance: bool,
}

impl TemplateArgs {
    pub fn to_input(&self, default_color1: &str, default_color2: &str) -> TemplateInput {
        TemplateInput {
            title: self.title.clone(),
            body: self.text.clone(),
            username: self.username.clone(),
            platform: Platform::from_name(&self.platform),
            color1: self.color1.clone().unwrap_or_else(|| default_color1.to_string()),
            color2: self.color2.clone().unwrap_or_else(|| default_color2.to_string()),
            background_image: self.background.clone(),
            gradient: GradientDirection::from_name(&self.gradient),
            crop: self.crop,
            style: TemplateStyle::from_name(&self.style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_command_parses_template_flags() {
        let args = Args::try_parse_from([
            "reelcard", "render", "--url", "https://example.com/v", "--start", "0:10", "--end",
            "01:00", "--title", "Hi", "--crop", "10,0,80,100", "--style", "classic",
        ])
        .unwrap();
        let Command::Render {
            url,
            start,
            end,
            template,
        } = args.command
        else {
            panic!("expected render");
        };
        assert_eq!(url, "https://example.com/v");
        assert_eq!((start, end), (Some(10), Some(60)));
        let input = template.to_input("#000000", "#FFFFFF");
        assert_eq!(input.style, TemplateStyle::Classic);
        assert_eq!(input.color1, "#000000");
        assert_eq!(input.crop.map(|c| c.w), Some(80.0));
    }

    #[test]
    fn bad_crop_is_rejected_at_parse_time() {
        let res = Args::try_parse_from(["reelcard", "compose", "--input", "a.mp4", "--crop", "50,0,60,100"]);
        assert!(res.is_err());
    }
}

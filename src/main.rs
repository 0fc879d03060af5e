use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reelcard::args::{Args, Command, TemplateArgs};
use reelcard::config::AppConfig;
use reelcard::enhance::TextEnhancer;
use reelcard::fonts::{FontCache, FontSet};
use reelcard::job::{TemplateInput, TemplateRenderer};
use reelcard::media::{Ffmpeg, MediaFetch, TimeRange, YtDlp};
use reelcard::utils::format_duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)?;
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }
    if args.groq_api_key.is_some() {
        config.groq_api_key = args.groq_api_key;
    }

    match args.command {
        Command::Info { url } => {
            let meta = tokio::task::spawn_blocking(move || YtDlp::default().probe(&url))
                .await?
                .context("could not read video metadata")?;
            println!("title:     {}", meta.title.as_deref().unwrap_or("-"));
            println!("duration:  {}", format_duration(meta.duration));
            println!("channel:   {}", meta.channel_name().unwrap_or("-"));
            println!("thumbnail: {}", meta.thumbnail.as_deref().unwrap_or("-"));
        }
        Command::Render {
            url,
            start,
            end,
            template,
        } => {
            if let (Some(s), Some(e)) = (start, end) {
                anyhow::ensure!(e > s, "--end ({e}s) must be after --start ({s}s)");
            }
            let input = prepare_input(&config, &template).await;
            let range = TimeRange::new(start, end);
            info!("Rendering {} into {}", url, config.output_dir.display());
            let output = tokio::task::spawn_blocking(move || {
                build_renderer(&config).render_url(
                    &YtDlp::default(),
                    &url,
                    range,
                    &input,
                    &config.output_dir,
                )
            })
            .await?
            .context("render failed")?;
            println!("{}", output.display());
        }
        Command::Compose { input, template } => {
            anyhow::ensure!(input.exists(), "input video not found: {}", input.display());
            let template_input = prepare_input(&config, &template).await;
            let output = tokio::task::spawn_blocking(move || {
                build_renderer(&config).render_file(&input, &template_input, &config.output_dir)
            })
            .await?
            .context("compose failed")?;
            println!("{}", output.display());
        }
    }

    info!("Process complete.");
    Ok(())
}

/// Template parameters from the CLI, run through the text enhancer when
/// requested.
async fn prepare_input(config: &AppConfig, template: &TemplateArgs) -> TemplateInput {
    let mut input = template.to_input(&config.default_color1, &config.default_color2);
    if !template.enhance {
        return input;
    }
    if input.body.trim().is_empty() {
        warn!("--enhance given without --text, nothing to enhance");
        return input;
    }
    let enhancer = TextEnhancer::new(config.groq_api_key.clone(), config.groq_model.clone());
    let enhanced = enhancer.enhance(&input.body).await;
    if input.title.trim().is_empty() {
        input.title = enhanced.title;
    }
    if !enhanced.body.trim().is_empty() {
        input.body = enhanced.body;
    }
    input
}

/// Fonts may be downloaded here, so this runs on a blocking thread.
fn build_renderer(config: &AppConfig) -> TemplateRenderer<Ffmpeg, Ffmpeg> {
    let cache = FontCache::new(&config.font_dir, config.download_fonts);
    let fonts = FontSet::load(&cache);
    TemplateRenderer::new(
        config.canvas,
        fonts,
        config.logo_path.clone(),
        Ffmpeg::default(),
        Ffmpeg::default(),
    )
}

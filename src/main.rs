use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vlog_compositor::{
    assets::ImageSource,
    audio::AudioSource,
    captions::{parse_caption_list, CaptionRenderer},
    composition::{CompositionEngine, RenderInput},
    config::Config,
    error::CompositorError,
    video::FfmpegSink,
};

#[derive(Parser)]
#[command(
    name = "vlog-compositor",
    version,
    about = "Turn still images and a soundtrack into a captioned slideshow video",
    long_about = "Vlog-Compositor animates each image with a slow zoom or a dimmed-background composite, crossfades between them, overlays optional captions and fits the audio to the result."
)]
struct Cli {
    /// Audio file path (WAV, MP3, FLAC, OGG, M4A); not needed with --preview
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Image file, in playback order (repeatable)
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Directory of images, played in file name order
    #[arg(long, conflicts_with = "images")]
    image_dir: Option<PathBuf>,

    /// JSON file holding an array of caption strings
    #[arg(long)]
    captions: Option<PathBuf>,

    /// Caption text, one per image in order (repeatable)
    #[arg(long = "caption", conflicts_with = "captions")]
    caption: Vec<String>,

    /// Output video file path (or PNG path with --preview)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Caption font file (TTF/OTF), overriding the configuration
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write the frame at this many seconds as a PNG instead of a video
    #[arg(long, value_name = "SECONDS")]
    preview: Option<f64>,

    /// Report whether ffmpeg and the caption font are usable, then exit
    #[arg(long)]
    check: bool,

    /// Write the default configuration to this path, then exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins unless --verbose is given
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Vlog-Compositor v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &cli.write_config {
        Config::default().save_to_file(path)?;
        info!("Default configuration written to {:?}", path);
        return Ok(());
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if let Some(font) = &cli.font {
        config.caption.font_path = Some(font.clone());
    }
    config.validate()?;

    if cli.check {
        return run_check(&config);
    }

    let output_path = cli.output.clone().ok_or_else(|| anyhow!("--output is required"))?;

    let images = match &cli.image_dir {
        Some(dir) => ImageSource::from_directory(dir)?,
        None => cli
            .images
            .iter()
            .map(ImageSource::from_path)
            .collect::<vlog_compositor::Result<Vec<_>>>()?,
    };
    if images.is_empty() {
        bail!("at least one --image or an --image-dir is required");
    }

    let captions = match &cli.captions {
        Some(path) => parse_caption_list(&std::fs::read_to_string(path)?),
        None => cli.caption.clone(),
    };

    info!("Images: {}", images.len());
    info!("Captions: {}", captions.len());
    info!("Output: {:?}", output_path);

    let engine = CompositionEngine::new(config);

    // Render jobs block, so keep them off the async workers
    let outcome = match cli.preview {
        Some(seconds) => {
            tokio::task::spawn_blocking(move || {
                write_preview(&engine, &images, &captions, seconds, &output_path)
            })
            .await?
        }
        None => {
            let audio_path = cli.audio.as_deref().ok_or_else(|| anyhow!("--audio is required"))?;
            info!("Audio: {:?}", audio_path);
            let input = RenderInput {
                images,
                audio: AudioSource::from_path(audio_path)?,
                captions,
            };
            tokio::task::spawn_blocking(move || write_video(&engine, &input, &output_path)).await?
        }
    };

    if let Err(e) = outcome {
        error!("{}", e.user_message());
        return Err(e.into());
    }
    Ok(())
}

fn write_video(engine: &CompositionEngine, input: &RenderInput, output_path: &Path) -> vlog_compositor::Result<()> {
    let rendered = engine.render(input)?;
    std::fs::write(output_path, &rendered.video)?;

    info!(
        "Composition complete! {:.1}s, {} frames, audio {} -> {:?}",
        rendered.duration, rendered.frame_count, rendered.audio_policy, output_path
    );
    Ok(())
}

fn write_preview(
    engine: &CompositionEngine,
    images: &[ImageSource],
    captions: &[String],
    seconds: f64,
    output_path: &Path,
) -> vlog_compositor::Result<()> {
    let frame = engine.preview_frame(images, captions, seconds)?;
    frame
        .save_png(output_path)
        .map_err(|e| CompositorError::generic(format!("failed to write preview: {}", e)))?;

    info!("Preview at {:.2}s saved to {:?}", seconds, output_path);
    Ok(())
}

fn run_check(config: &Config) -> Result<()> {
    let ffmpeg = FfmpegSink::is_available();
    if ffmpeg {
        info!("ffmpeg: available");
    } else {
        warn!("ffmpeg: not found on PATH (required for video output)");
    }

    match CaptionRenderer::load(&config.caption) {
        Ok(_) => info!("caption font: {:?} loaded", config.caption.font_path),
        Err(e) => warn!("caption font: {} (captions will be skipped)", e),
    }

    if !ffmpeg {
        bail!("ffmpeg is required to render videos");
    }
    Ok(())
}

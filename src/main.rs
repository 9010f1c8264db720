use anyhow::Context;
use clap::Parser;
use slide_narrator::api::{GoogleTts, HuggingFaceClient};
use slide_narrator::config::DEFAULT_INFERENCE_URL;
use slide_narrator::video::Ffmpeg;
use slide_narrator::{
    MissingAudioPolicy, ModelRegistry, NarrationPipeline, PipelineConfig, RunRequest,
    SlideDirection, TransitionSettings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slide-narrator")]
#[command(about = "Create a narrated slideshow video from a folder of images", long_about = None)]
struct Args {
    /// Directory containing input images (png, jpg, jpeg)
    #[arg(short, long)]
    image_dir: PathBuf,

    /// Output video file path
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// Transition duration in seconds
    #[arg(short, long, default_value_t = 1.0)]
    transition: f64,

    /// Slide transition direction
    #[arg(short, long, value_enum, default_value_t = SlideDirection::Left)]
    slide: SlideDirection,

    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parent directory for the temporary workspace
    #[arg(short = 'w', long)]
    work_dir: Option<PathBuf>,

    /// What to do with images that end up without narration
    #[arg(long, value_enum)]
    missing_audio: Option<MissingAudioPolicy>,

    /// Inference service base URL
    #[arg(long, env = "HF_INFERENCE_URL")]
    inference_url: Option<String>,

    /// Inference service API token
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// ffmpeg binary
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// ffprobe binary
    #[arg(long, default_value = "ffprobe")]
    ffprobe: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量（RUST_LOG、HF_TOKEN 等）
    dotenvy::dotenv().ok();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(url) = &args.inference_url {
        config.models.inference_url = url.clone();
    }
    if let Some(policy) = args.missing_audio {
        config.missing_audio = policy;
    }
    if config.models.inference_url.trim().is_empty() {
        config.models.inference_url = DEFAULT_INFERENCE_URL.to_string();
    }

    let inference = Arc::new(
        HuggingFaceClient::new(&config.models.inference_url, args.hf_token.clone())
            .context("Failed to create inference client")?,
    );
    let speech = Arc::new(GoogleTts::new().context("Failed to create TTS client")?);
    let media = Arc::new(Ffmpeg::new(config.encoding.clone()).with_binaries(&args.ffmpeg, &args.ffprobe));
    let registry = ModelRegistry::new(inference.clone(), inference, config.models.clone());

    let request = RunRequest {
        image_dir: args.image_dir,
        output_path: args.output,
        transition: TransitionSettings {
            duration: args.transition,
            direction: args.slide,
        },
        workspace_root: args.work_dir,
    };

    info!("Starting video generation from {}", request.image_dir.display());

    let pipeline = NarrationPipeline::new(&registry, speech, media, config);
    match pipeline.run(&request).await {
        Ok(report) => {
            info!(
                "Video created successfully: {} ({} clips, {:.1}s)",
                report.output_path.display(),
                report.clip_count,
                report.total_duration
            );
            if !report.dropped_images.is_empty() {
                info!("Images without narration: {:?}", report.dropped_images);
            }
            Ok(())
        }
        Err(e) => {
            error!("Video generation failed at {} stage: {}", e.stage(), e);
            std::process::exit(1);
        }
    }
}

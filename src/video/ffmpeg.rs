use super::compositor::ClipPlan;
use super::{Canvas, MediaEngine};
use crate::config::EncodingConfig;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

const AUDIO_SAMPLE_RATE: &str = "44100";

/// 基于 ffmpeg/ffprobe 命令行的实现
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_path: String,
    ffprobe_path: String,
    encoding: EncodingConfig,
}

impl Ffmpeg {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            encoding,
        }
    }

    pub fn with_binaries(mut self, ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self.ffprobe_path = ffprobe_path.into();
        self
    }

    async fn run_ffmpeg(&self, args: &[String], action: &str) -> Result<()> {
        debug!("ffmpeg {}", args.join(" "));

        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .output()
            .await
            .map_err(|e| VideoError::VideoGeneration(format!("Failed to run FFmpeg: {}", e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Ffmpeg(format!("{} failed: {}", action, error.trim())));
        }

        Ok(())
    }

    async fn run_ffprobe(&self, args: &[&str], path: &Path) -> Result<serde_json::Value> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json"])
            .args(args)
            .arg(path)
            .output()
            .await
            .map_err(|e| VideoError::VideoGeneration(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(VideoError::Ffmpeg(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn clip_args(&self, clip: &ClipPlan, canvas: Canvas, output_path: &Path) -> Vec<String> {
        let fps = self.encoding.fps.to_string();
        let duration = format!("{:.6}", clip.duration);
        let filter = format!(
            "[1:v]format=rgba[fg];\
             [0:v][fg]overlay=x='{}':y='{}':eval=frame:shortest=1,format={}[v];\
             [2:a]apad[a]",
            clip.motion.x_expr(),
            clip.motion.y_expr(),
            self.encoding.pixel_format
        );

        let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(format!(
            "color=c=black:s={}x{}:r={}:d={}",
            canvas.width, canvas.height, fps, duration
        ));
        args.extend(["-loop", "1", "-framerate", fps.as_str(), "-i"].map(String::from));
        args.push(path_arg(&clip.image_path));
        args.push("-i".to_string());
        args.push(path_arg(&clip.audio_path));
        args.extend(
            [
                "-filter_complex",
                filter.as_str(),
                "-map",
                "[v]",
                "-map",
                "[a]",
                "-t",
                duration.as_str(),
                "-r",
                fps.as_str(),
                "-c:v",
                self.encoding.video_codec.as_str(),
                "-pix_fmt",
                self.encoding.pixel_format.as_str(),
                "-c:a",
                self.encoding.audio_codec.as_str(),
                "-ar",
                AUDIO_SAMPLE_RATE,
                "-ac",
                "2",
            ]
            .map(String::from),
        );
        args.push(path_arg(output_path));
        args
    }

    fn concat_args(list_path: &Path, output_path: &Path) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y", "-hide_banner", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i",
        ]
        .map(String::from)
        .to_vec();
        args.push(path_arg(list_path));
        args.extend(["-c", "copy", "-movflags", "+faststart"].map(String::from));
        args.push(path_arg(output_path));
        args
    }
}

#[async_trait]
impl MediaEngine for Ffmpeg {
    async fn audio_duration(&self, path: &Path) -> Result<f64> {
        let json = self.run_ffprobe(&["-show_format"], path).await?;
        parse_duration(&json).ok_or_else(|| {
            VideoError::Ffmpeg(format!("No duration reported for {}", path.display()))
        })
    }

    async fn image_size(&self, path: &Path) -> Result<(u32, u32)> {
        let json = self
            .run_ffprobe(&["-show_streams", "-select_streams", "v:0"], path)
            .await?;
        parse_dimensions(&json).ok_or_else(|| {
            VideoError::Ffmpeg(format!("No image dimensions reported for {}", path.display()))
        })
    }

    async fn render_clip(&self, clip: &ClipPlan, canvas: Canvas, output_path: &Path) -> Result<()> {
        let args = self.clip_args(clip, canvas, output_path);
        self.run_ffmpeg(&args, "FFmpeg clip rendering").await
    }

    async fn concat(&self, clips: &[PathBuf], work_dir: &Path, output_path: &Path) -> Result<()> {
        info!("Concatenating {} clips...", clips.len());

        let mut concat_content = String::new();
        for clip in clips {
            // 拼接列表中使用绝对路径
            let absolute = tokio::fs::canonicalize(clip).await.map_err(|e| {
                VideoError::VideoGeneration(format!(
                    "Failed to get absolute path of {}: {}",
                    clip.display(),
                    e
                ))
            })?;
            concat_content.push_str(&concat_entry(&absolute));
        }

        let list_path = work_dir.join("concat.txt");
        tokio::fs::write(&list_path, concat_content).await?;

        let args = Self::concat_args(&list_path, output_path);
        self.run_ffmpeg(&args, "FFmpeg concat").await
    }

    async fn silence(&self, seconds: f64, output_path: &Path) -> Result<()> {
        let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"]
            .map(String::from)
            .to_vec();
        args.push(format!("anullsrc=r={}:cl=stereo", AUDIO_SAMPLE_RATE));
        args.extend(["-t".to_string(), format!("{:.3}", seconds)]);
        args.extend(["-c:a", "libmp3lame", "-q:a", "9"].map(String::from));
        args.push(path_arg(output_path));
        self.run_ffmpeg(&args, "FFmpeg silence generation").await
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// concat demuxer 的一行，单引号需要转义
fn concat_entry(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'\n", escaped)
}

fn parse_duration(json: &serde_json::Value) -> Option<f64> {
    json["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| json["format"]["duration"].as_f64())
        .filter(|d| d.is_finite() && *d > 0.0)
}

fn parse_dimensions(json: &serde_json::Value) -> Option<(u32, u32)> {
    let stream = json["streams"].as_array()?.first()?;
    let width = u32::try_from(stream["width"].as_u64()?).ok()?;
    let height = u32::try_from(stream["height"].as_u64()?).ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

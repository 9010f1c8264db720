use super::transition::SlideMotion;
use super::{Canvas, MediaEngine};
use crate::config::{MissingAudioPolicy, TransitionSettings};
use crate::error::{Result, VideoError};
use crate::scene::{file_name, AudioTrack, Scene};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 一个待渲染的片段：图片 + 音频 + 位移动画
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    /// 图片序号
    pub index: usize,
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub duration: f64,
    pub motion: SlideMotion,
}

/// 合成结果
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub clip_count: usize,
    /// 因没有音频而未进入视频的图片序号
    pub dropped_images: Vec<usize>,
    pub total_duration: f64,
}

pub struct VideoGenerator<'a> {
    media: &'a dyn MediaEngine,
    work_dir: PathBuf,
    transition: TransitionSettings,
    missing_audio: MissingAudioPolicy,
    placeholder_seconds: f64,
}

impl<'a> VideoGenerator<'a> {
    pub fn new(
        media: &'a dyn MediaEngine,
        work_dir: PathBuf,
        transition: TransitionSettings,
        missing_audio: MissingAudioPolicy,
        placeholder_seconds: f64,
    ) -> Self {
        Self {
            media,
            work_dir,
            transition,
            missing_audio,
            placeholder_seconds,
        }
    }

    /// 合成最终视频
    pub async fn generate_video(&self, scenes: &[Scene], output_path: &Path) -> Result<Composition> {
        info!("Starting video generation...");

        let (pairs, dropped_images) = self.resolve_audio(scenes).await?;
        if pairs.is_empty() {
            return Err(VideoError::VideoGeneration(
                "No clips to assemble: every narration segment is empty".to_string(),
            ));
        }

        let clips = plan_clips(&pairs, &self.transition);

        let mut sizes = Vec::with_capacity(clips.len());
        for clip in &clips {
            sizes.push(self.media.image_size(&clip.image_path).await?);
        }
        let canvas = Canvas::fit(&sizes);
        info!("Canvas size: {}x{}", canvas.width, canvas.height);

        // 为每张图片渲染一个带转场的片段
        let mut clip_paths = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            let clip_path = self.work_dir.join(format!("clip_{}.mp4", clip.index));
            self.media.render_clip(clip, canvas, &clip_path).await?;
            info!(
                "Created clip {}/{} for {} ({:.2}s)",
                i + 1,
                clips.len(),
                file_name(&clip.image_path),
                clip.duration
            );
            clip_paths.push(clip_path);
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 合并所有片段
        self.media
            .concat(&clip_paths, &self.work_dir, output_path)
            .await?;

        let total_duration = clips.iter().map(|clip| clip.duration).sum();
        info!(
            "Video generation completed: {} ({} clips, {:.2}s)",
            output_path.display(),
            clips.len(),
            total_duration
        );

        Ok(Composition {
            clip_count: clips.len(),
            dropped_images,
            total_duration,
        })
    }

    /// 按序号把图片和音频配对，缺少音频的图片按策略处理
    async fn resolve_audio(&self, scenes: &[Scene]) -> Result<(Vec<(PathBuf, AudioTrack)>, Vec<usize>)> {
        let mut pairs = Vec::with_capacity(scenes.len());
        let mut dropped = Vec::new();

        for scene in scenes {
            if let Some(track) = &scene.audio {
                pairs.push((scene.image_path.clone(), track.clone()));
                continue;
            }

            let image = file_name(&scene.image_path);
            match self.missing_audio {
                MissingAudioPolicy::Skip => {
                    warn!("Image {} ({}) has no narration and is left out of the video", scene.index, image);
                    dropped.push(scene.index);
                }
                MissingAudioPolicy::Error => {
                    return Err(VideoError::MissingAudio {
                        index: scene.index,
                        image,
                    });
                }
                MissingAudioPolicy::Placeholder => {
                    let path = self.work_dir.join(format!("silence_{}.mp3", scene.index));
                    self.media.silence(self.placeholder_seconds, &path).await?;
                    warn!(
                        "Image {} ({}) has no narration, using {:.1}s of silence",
                        scene.index, image, self.placeholder_seconds
                    );
                    pairs.push((
                        scene.image_path.clone(),
                        AudioTrack {
                            index: scene.index,
                            path,
                            duration: self.placeholder_seconds,
                        },
                    ));
                }
            }
        }

        Ok((pairs, dropped))
    }
}

/// 第一个片段不做 slide-in，最后一个片段不做 slide-out
pub fn plan_clips(pairs: &[(PathBuf, AudioTrack)], transition: &TransitionSettings) -> Vec<ClipPlan> {
    let last = pairs.len().saturating_sub(1);

    pairs
        .iter()
        .enumerate()
        .map(|(i, (image_path, track))| ClipPlan {
            index: track.index,
            image_path: image_path.clone(),
            audio_path: track.path.clone(),
            duration: track.duration,
            motion: SlideMotion::new(
                transition.direction,
                transition.duration,
                track.duration,
                i > 0,
                i < last,
            ),
        })
        .collect()
}

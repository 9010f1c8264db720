use crate::api::SpeechBackend;
use crate::config::VoiceConfig;
use crate::error::{Result, VideoError};
use crate::scene::AudioTrack;
use crate::video::MediaEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    voice: VoiceConfig,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>, voice: VoiceConfig) -> Self {
        Self { backend, voice }
    }

    /// 为每个非空片段生成语音，空片段直接跳过（不生成静音）。
    /// 返回结果按片段序号排列，数量可能少于片段数。
    pub async fn synthesize(
        &self,
        segments: &[String],
        workspace: &Path,
        media: &dyn MediaEngine,
    ) -> Result<Vec<AudioTrack>> {
        let mut tracks = Vec::new();

        for (index, text) in segments.iter().enumerate() {
            let text = text.trim();
            if text.is_empty() {
                debug!("Segment {} is empty, no audio", index);
                continue;
            }

            let path = audio_path(workspace, index);
            self.backend
                .synthesize(text, &self.voice, &path)
                .await
                .map_err(|e| match e {
                    VideoError::SpeechSynthesis(_) => e,
                    other => VideoError::SpeechSynthesis(format!("segment {}: {}", index, other)),
                })?;

            let duration = media.audio_duration(&path).await?;
            info!("Synthesized segment {} ({:.2}s)", index, duration);
            tracks.push(AudioTrack {
                index,
                path,
                duration,
            });
        }

        Ok(tracks)
    }
}

pub fn audio_path(workspace: &Path, index: usize) -> PathBuf {
    workspace.join(format!("audio_{}.mp3", index))
}

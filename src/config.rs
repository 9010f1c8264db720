use crate::error::{Result, VideoError};
use crate::video::transition::SlideDirection;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

/// 流水线的固定参数（每次运行的转场设置见 `TransitionSettings`）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub models: ModelConfig,
    pub generation: GenerationParams,
    pub script: ScriptConfig,
    pub voice: VoiceConfig,
    pub encoding: EncodingConfig,
    pub missing_audio: MissingAudioPolicy,
    /// `placeholder` 策略下静音片段的时长（秒）
    pub placeholder_seconds: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: ModelConfig::default(),
            generation: GenerationParams::default(),
            script: ScriptConfig::default(),
            voice: VoiceConfig::default(),
            encoding: EncodingConfig::default(),
            missing_audio: MissingAudioPolicy::Skip,
            placeholder_seconds: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub inference_url: String,
    pub caption_primary: String,
    pub caption_secondary: String,
    pub text: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            caption_primary: "nlpconnect/vit-gpt2-image-captioning".to_string(),
            caption_secondary: "microsoft/git-base-coco".to_string(),
            text: "gpt2".to_string(),
        }
    }
}

/// 文本生成的长度上限与确定性控制
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub no_repeat_ngram_size: u32,
    pub temperature: f64,
    pub num_return_sequences: u32,
    pub do_sample: bool,
    /// 返回结果是否包含提示词本身
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 500,
            no_repeat_ngram_size: 2,
            temperature: 0.7,
            num_return_sequences: 1,
            do_sample: false,
            return_full_text: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub prompt_prefix: String,
    pub caption_separator: String,
    pub minimum_segment_size: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            prompt_prefix: "Create a narrative script based on these image descriptions: "
                .to_string(),
            caption_separator: ". ".to_string(),
            minimum_segment_size: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    pub lang: String,
    pub tld: String,
    pub slow: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            tld: "com".to_string(),
            slow: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

/// 没有音频的图片如何处理
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingAudioPolicy {
    /// 跳过该图片（记录警告）
    #[default]
    Skip,
    /// 直接报错
    Error,
    /// 生成一段静音作为该图片的音频
    Placeholder,
}

/// 单次运行的转场设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TransitionSettings {
    pub duration: f64,
    pub direction: SlideDirection,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: 1.0,
            direction: SlideDirection::Left,
        }
    }
}

impl TransitionSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(VideoError::Config(format!(
                "transition duration must be a positive number of seconds, got {}",
                self.duration
            )));
        }
        Ok(())
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let models = [
            ("caption_primary", &self.models.caption_primary),
            ("caption_secondary", &self.models.caption_secondary),
            ("text", &self.models.text),
        ];
        for (field, name) in models {
            if name.trim().is_empty() {
                return Err(VideoError::Config(format!("models.{} must not be empty", field)));
            }
        }
        if self.script.minimum_segment_size == 0 {
            return Err(VideoError::Config(
                "script.minimum_segment_size must be at least 1".to_string(),
            ));
        }
        if self.encoding.fps == 0 {
            return Err(VideoError::Config("encoding.fps must be positive".to_string()));
        }
        if !(self.placeholder_seconds.is_finite() && self.placeholder_seconds > 0.0) {
            return Err(VideoError::Config(
                "placeholder_seconds must be positive".to_string(),
            ));
        }
        if self.generation.max_new_tokens == 0 {
            return Err(VideoError::Config(
                "generation.max_new_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

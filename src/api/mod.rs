mod gtts;
mod huggingface;

pub use gtts::GoogleTts;
pub use huggingface::HuggingFaceClient;

use crate::config::{GenerationParams, VoiceConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// 图片描述推理服务
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// 确认模型可用，失败即视为加载失败
    async fn load(&self, model: &str) -> Result<()>;

    async fn caption(&self, model: &str, image_path: &Path) -> Result<String>;
}

/// 文本生成推理服务
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn load(&self, model: &str) -> Result<()>;

    async fn generate(&self, model: &str, prompt: &str, params: &GenerationParams)
        -> Result<String>;
}

/// 语音合成服务，把音频写到 `output_path`
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig, output_path: &Path) -> Result<()>;
}

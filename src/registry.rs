use crate::api::{CaptionBackend, TextBackend};
use crate::config::ModelConfig;
use crate::error::{Result, VideoError};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// 多次运行共享的模型；每个模型最多解析一次，失败不缓存
pub struct ModelRegistry {
    caption_backend: Arc<dyn CaptionBackend>,
    text_backend: Arc<dyn TextBackend>,
    models: ModelConfig,
    caption_model: OnceCell<String>,
    text_model: OnceCell<String>,
}

impl ModelRegistry {
    pub fn new(
        caption_backend: Arc<dyn CaptionBackend>,
        text_backend: Arc<dyn TextBackend>,
        models: ModelConfig,
    ) -> Self {
        Self {
            caption_backend,
            text_backend,
            models,
            caption_model: OnceCell::new(),
            text_model: OnceCell::new(),
        }
    }

    pub fn caption_backend(&self) -> &Arc<dyn CaptionBackend> {
        &self.caption_backend
    }

    pub fn text_backend(&self) -> &Arc<dyn TextBackend> {
        &self.text_backend
    }

    /// 主模型加载失败时改用备用模型，两者都失败则返回 `NoCaptionModel`
    pub async fn caption_model(&self) -> Result<&str> {
        let model = self
            .caption_model
            .get_or_try_init(|| async {
                let primary = &self.models.caption_primary;
                match self.caption_backend.load(primary).await {
                    Ok(()) => {
                        info!("Using image captioning model: {}", primary);
                        return Ok(primary.clone());
                    }
                    Err(e) => warn!("Error loading primary captioning model {}: {}", primary, e),
                }

                let secondary = &self.models.caption_secondary;
                match self.caption_backend.load(secondary).await {
                    Ok(()) => {
                        info!("Using fallback image captioning model: {}", secondary);
                        Ok(secondary.clone())
                    }
                    Err(e) => Err(VideoError::NoCaptionModel(format!(
                        "{} and {} both failed to load, last error: {}",
                        primary, secondary, e
                    ))),
                }
            })
            .await?;

        Ok(model.as_str())
    }

    pub async fn text_model(&self) -> Result<&str> {
        let model = self
            .text_model
            .get_or_try_init(|| async {
                let name = &self.models.text;
                info!("Loading text generation model: {}", name);
                self.text_backend
                    .load(name)
                    .await
                    .map_err(|e| VideoError::NoTextModel(format!("{}: {}", name, e)))?;
                Ok::<_, VideoError>(name.clone())
            })
            .await?;

        Ok(model.as_str())
    }
}

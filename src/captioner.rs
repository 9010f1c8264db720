use crate::api::CaptionBackend;
use crate::error::Result;
use crate::registry::ModelRegistry;
use crate::scene::{file_name, ImageSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// 为每张图片生成一句描述，模型在实例化时选定
pub struct Captioner {
    backend: Arc<dyn CaptionBackend>,
    model: String,
}

impl Captioner {
    /// 没有可用的描述模型时返回 `NoCaptionModel`
    pub async fn load(registry: &ModelRegistry) -> Result<Self> {
        let model = registry.caption_model().await?.to_string();
        Ok(Self {
            backend: Arc::clone(registry.caption_backend()),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 单张图片失败不会中断，改用兜底描述
    pub async fn caption(&self, image_path: &Path) -> String {
        let name = file_name(image_path);
        info!("Captioning image: {}", name);

        match self.backend.caption(&self.model, image_path).await {
            Ok(caption) if !caption.trim().is_empty() => {
                info!("Caption: {}", caption);
                caption
            }
            Ok(_) => {
                warn!("Empty caption for {}, using fallback", name);
                fallback_caption(&name)
            }
            Err(e) => {
                warn!("Error captioning image {}: {}", name, e);
                fallback_caption(&name)
            }
        }
    }

    /// 按顺序逐张生成描述，结果与图片一一对应
    pub async fn caption_all(&self, images: &ImageSet) -> Vec<String> {
        let mut captions = Vec::with_capacity(images.len());
        for path in images.paths() {
            captions.push(self.caption(path).await);
        }
        captions
    }
}

pub fn fallback_caption(file_name: &str) -> String {
    format!("An image showing {}", file_name)
}

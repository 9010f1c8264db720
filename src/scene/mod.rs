mod images;
mod script;

pub use images::{file_name, is_supported_image, ImageSet, SUPPORTED_EXTENSIONS};
pub use script::{segment, Script};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 某个片段合成出的语音文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// 对应的片段/图片序号
    pub index: usize,
    pub path: PathBuf,
    /// 时长（秒）
    pub duration: f64,
}

/// 表示一张图片及其旁白
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// 图片序号
    pub index: usize,
    pub image_path: PathBuf,
    /// 图片描述
    pub caption: String,
    /// 分配给这张图片的旁白片段，可能为空
    pub narration: String,
    /// 合成的语音，旁白为空时没有
    pub audio: Option<AudioTrack>,
}

impl Scene {
    pub fn new(index: usize, image_path: PathBuf, caption: String, narration: String) -> Self {
        Self {
            index,
            image_path,
            caption,
            narration,
            audio: None,
        }
    }
}

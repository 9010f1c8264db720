mod compositor;
mod ffmpeg;
pub mod transition;

pub use compositor::{plan_clips, ClipPlan, Composition, VideoGenerator};
pub use ffmpeg::Ffmpeg;
pub use transition::{transition_window, SlideDirection, SlideMotion};

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 所有片段共用的画布尺寸（偶数，满足 yuv420p）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// 取所有图片中最大的宽和高，不足则补齐
    pub fn fit(sizes: &[(u32, u32)]) -> Self {
        let width = sizes.iter().map(|(w, _)| *w).max().unwrap_or(2);
        let height = sizes.iter().map(|(_, h)| *h).max().unwrap_or(2);
        Self {
            width: round_up_even(width),
            height: round_up_even(height),
        }
    }
}

fn round_up_even(value: u32) -> u32 {
    let value = value.max(2);
    value + value % 2
}

/// 音视频处理引擎：探测时长/尺寸、渲染单个片段、拼接
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn audio_duration(&self, path: &Path) -> Result<f64>;

    async fn image_size(&self, path: &Path) -> Result<(u32, u32)>;

    async fn render_clip(&self, clip: &ClipPlan, canvas: Canvas, output_path: &Path) -> Result<()>;

    /// 按顺序拼接，`work_dir` 用来存放拼接列表
    async fn concat(&self, clips: &[PathBuf], work_dir: &Path, output_path: &Path) -> Result<()>;

    async fn silence(&self, seconds: f64, output_path: &Path) -> Result<()>;
}

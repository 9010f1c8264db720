use crate::error::{Result, VideoError};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 按文件名排序的输入图片，顺序即旁白和播放顺序
#[derive(Debug, Clone)]
pub struct ImageSet {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl ImageSet {
    /// 读取目录下所有 png/jpg/jpeg 图片（不区分大小写），按文件名字典序排序
    pub async fn load(dir: &Path) -> Result<Self> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_supported_image(name) {
                continue;
            }
            if !tokio::fs::metadata(entry.path()).await?.is_file() {
                continue;
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            return Err(VideoError::EmptyInput(dir.display().to_string()));
        }

        names.sort();
        info!("Found {} images in {}", names.len(), dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            files: names.into_iter().map(|name| dir.join(name)).collect(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

pub fn is_supported_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// 日志和兜底字幕中使用的文件名
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

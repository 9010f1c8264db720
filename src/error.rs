use std::fmt;
use thiserror::Error;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Input,
    Workspace,
    Captioning,
    Script,
    Speech,
    Video,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Input => "input",
            Stage::Workspace => "workspace",
            Stage::Captioning => "captioning",
            Stage::Script => "script",
            Stage::Speech => "speech",
            Stage::Video => "video",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("No supported images (png, jpg, jpeg) found in {0}")]
    EmptyInput(String),

    #[error("No image captioning model could be loaded: {0}")]
    NoCaptionModel(String),

    #[error("Text generation model could not be loaded: {0}")]
    NoTextModel(String),

    #[error("Speech synthesis error: {0}")]
    SpeechSynthesis(String),

    #[error("No audio for image {index} ({image})")]
    MissingAudio { index: usize, image: String },

    #[error("Video generation error: {0}")]
    VideoGeneration(String),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// 流水线在某一步失败，保留原始错误
    #[error("{source}")]
    Failed {
        stage: Stage,
        #[source]
        source: Box<VideoError>,
    },
}

impl VideoError {
    /// 标记出错的阶段；已标记过的错误保持不变
    pub fn at(self, stage: Stage) -> Self {
        match self {
            tagged @ VideoError::Failed { .. } => tagged,
            other => VideoError::Failed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// 去掉阶段标记后的原始错误
    pub fn root(&self) -> &VideoError {
        match self {
            VideoError::Failed { source, .. } => source.root(),
            other => other,
        }
    }

    /// 出错的流水线阶段，供调用方输出结构化错误。
    /// 未经流水线标记的错误按类型推断。
    pub fn stage(&self) -> &'static str {
        match self {
            VideoError::Failed { stage, .. } => stage.as_str(),
            VideoError::EmptyInput(_) => "input",
            VideoError::NoCaptionModel(_) => "captioning",
            VideoError::NoTextModel(_) => "script",
            VideoError::SpeechSynthesis(_) => "speech",
            VideoError::MissingAudio { .. }
            | VideoError::VideoGeneration(_)
            | VideoError::Ffmpeg(_) => "video",
            VideoError::Config(_) | VideoError::Toml(_) => "config",
            VideoError::Api(_) | VideoError::Http(_) | VideoError::Json(_) => "api",
            VideoError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, VideoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_stage_overrides_variant() {
        let err = VideoError::Api("HTTP 503".to_string()).at(Stage::Script);
        assert_eq!(err.stage(), "script");
        assert!(matches!(err.root(), VideoError::Api(_)));
        assert_eq!(err.to_string(), "API error: HTTP 503");
    }

    #[test]
    fn first_tag_is_kept() {
        let err = VideoError::Ffmpeg("unreadable ffprobe output".to_string())
            .at(Stage::Video)
            .at(Stage::Workspace);
        assert_eq!(err.stage(), "video");
    }

    #[test]
    fn untagged_errors_fall_back_to_variant() {
        assert_eq!(VideoError::EmptyInput("imgs".to_string()).stage(), "input");
        assert_eq!(VideoError::SpeechSynthesis("x".to_string()).stage(), "speech");
    }
}

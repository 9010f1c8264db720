use crate::api::SpeechBackend;
use crate::captioner::Captioner;
use crate::config::{PipelineConfig, TransitionSettings};
use crate::error::{Result, Stage};
use crate::narrative::ScriptSynthesizer;
use crate::registry::ModelRegistry;
use crate::scene::{ImageSet, Scene, Script};
use crate::speech::SpeechSynthesizer;
use crate::video::{MediaEngine, VideoGenerator};
use crate::workspace::Workspace;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 一次运行的输入
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub image_dir: PathBuf,
    pub output_path: PathBuf,
    pub transition: TransitionSettings,
    /// 临时目录的父目录，默认使用系统临时目录
    pub workspace_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub captions: Vec<String>,
    pub script: Script,
    pub scenes: Vec<Scene>,
    pub clip_count: usize,
    pub dropped_images: Vec<usize>,
    pub total_duration: f64,
}

/// 图片 → 描述 → 旁白 → 语音 → 视频
pub struct NarrationPipeline<'a> {
    registry: &'a ModelRegistry,
    speech: Arc<dyn SpeechBackend>,
    media: Arc<dyn MediaEngine>,
    config: PipelineConfig,
}

impl<'a> NarrationPipeline<'a> {
    pub fn new(
        registry: &'a ModelRegistry,
        speech: Arc<dyn SpeechBackend>,
        media: Arc<dyn MediaEngine>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            speech,
            media,
            config,
        }
    }

    /// 完整运行一次；无论成功与否，临时目录都会被删除
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        self.config.validate().map_err(|e| e.at(Stage::Config))?;

        let images = ImageSet::load(&request.image_dir)
            .await
            .map_err(|e| e.at(Stage::Input))?;
        request
            .transition
            .validate()
            .map_err(|e| e.at(Stage::Config))?;
        info!(
            "Transition duration: {}, Style: {}",
            request.transition.duration, request.transition.direction
        );

        let workspace = Workspace::create(request.workspace_root.as_deref())
            .map_err(|e| e.at(Stage::Workspace))?;
        match self.run_in_workspace(&images, request, &workspace).await {
            Ok(report) => {
                workspace
                    .close()
                    .map_err(|e| e.at(Stage::Workspace))?;
                Ok(report)
            }
            Err(e) => {
                if let Err(close_err) = workspace.close() {
                    warn!("Failed to remove workspace: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn run_in_workspace(
        &self,
        images: &ImageSet,
        request: &RunRequest,
        workspace: &Workspace,
    ) -> Result<RunReport> {
        // 1. 加载模型并为图片生成描述
        info!(
            "Step 1/4: Generating captions for {} images in {}...",
            images.len(),
            images.dir().display()
        );
        let captioner = Captioner::load(self.registry)
            .await
            .map_err(|e| e.at(Stage::Captioning))?;
        self.registry
            .text_model()
            .await
            .map_err(|e| e.at(Stage::Script))?;
        let captions = captioner.caption_all(images).await;

        // 2. 生成旁白并切分
        info!("Step 2/4: Generating script...");
        let script = ScriptSynthesizer::new(
            self.registry,
            &self.config.script,
            &self.config.generation,
        )
        .synthesize(&captions)
        .await
        .map_err(|e| e.at(Stage::Script))?;

        let mut scenes: Vec<Scene> = images
            .paths()
            .iter()
            .zip(captions.iter().zip(script.segments.iter()))
            .enumerate()
            .map(|(index, (path, (caption, narration)))| {
                Scene::new(index, path.clone(), caption.clone(), narration.clone())
            })
            .collect();

        // 3. 生成语音
        info!("Step 3/4: Converting script to speech...");
        let speech = SpeechSynthesizer::new(Arc::clone(&self.speech), self.config.voice.clone());
        let tracks = speech
            .synthesize(&script.segments, workspace.path(), self.media.as_ref())
            .await
            .map_err(|e| e.at(Stage::Speech))?;
        for track in tracks {
            if let Some(scene) = scenes.get_mut(track.index) {
                scene.audio = Some(track);
            }
        }

        // 4. 合成视频
        info!("Step 4/4: Creating video...");
        let generator = VideoGenerator::new(
            self.media.as_ref(),
            workspace.path().to_path_buf(),
            request.transition,
            self.config.missing_audio,
            self.config.placeholder_seconds,
        );
        let composition = generator
            .generate_video(&scenes, &request.output_path)
            .await
            .map_err(|e| e.at(Stage::Video))?;

        Ok(RunReport {
            output_path: request.output_path.clone(),
            captions,
            script,
            scenes,
            clip_count: composition.clip_count,
            dropped_images: composition.dropped_images,
            total_duration: composition.total_duration,
        })
    }
}

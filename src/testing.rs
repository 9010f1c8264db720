use crate::api::{CaptionBackend, SpeechBackend, TextBackend};
use crate::config::{GenerationParams, VoiceConfig};
use crate::error::{Result, VideoError};
use crate::scene::file_name;
use crate::video::{Canvas, ClipPlan, MediaEngine};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
}

pub fn write_images(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"not really an image").unwrap();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeCaptioner {
    captions: HashMap<String, String>,
    failing: HashSet<String>,
    unloadable: HashSet<String>,
    loads: Counter,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeCaptioner {
    pub fn with_caption(mut self, image: &str, caption: &str) -> Self {
        self.captions.insert(image.to_string(), caption.to_string());
        self
    }

    pub fn failing_on(mut self, image: &str) -> Self {
        self.failing.insert(image.to_string());
        self
    }

    pub fn unloadable(mut self, model: &str) -> Self {
        self.unloadable.insert(model.to_string());
        self
    }

    pub fn load_counter(&self) -> Counter {
        self.loads.clone()
    }

    /// 每次调用的 (模型, 文件名)
    pub fn calls(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CaptionBackend for FakeCaptioner {
    async fn load(&self, model: &str) -> Result<()> {
        self.loads.bump();
        if self.unloadable.contains(model) {
            return Err(VideoError::Api(format!("{} is unavailable", model)));
        }
        Ok(())
    }

    async fn caption(&self, model: &str, image_path: &Path) -> Result<String> {
        let name = file_name(image_path);
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), name.clone()));

        if self.failing.contains(&name) {
            return Err(VideoError::Api(format!("inference failed for {}", name)));
        }
        Ok(self
            .captions
            .get(&name)
            .cloned()
            .unwrap_or_else(|| format!("a photo of {}", name)))
    }
}

#[derive(Debug, Clone)]
pub struct FakeTextModel {
    output: String,
    unloadable: bool,
    failing_generation: bool,
    loads: Counter,
    prompts: Arc<Mutex<Vec<(String, GenerationParams)>>>,
}

impl Default for FakeTextModel {
    fn default() -> Self {
        Self {
            output: words(120),
            unloadable: false,
            failing_generation: false,
            loads: Counter::default(),
            prompts: Arc::default(),
        }
    }
}

impl FakeTextModel {
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    pub fn unloadable(mut self) -> Self {
        self.unloadable = true;
        self
    }

    /// 模型能加载，但每次生成都失败
    pub fn failing_generation(mut self) -> Self {
        self.failing_generation = true;
        self
    }

    pub fn load_counter(&self) -> Counter {
        self.loads.clone()
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<(String, GenerationParams)>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl TextBackend for FakeTextModel {
    async fn load(&self, model: &str) -> Result<()> {
        self.loads.bump();
        if self.unloadable {
            return Err(VideoError::Api(format!("{} is unavailable", model)));
        }
        Ok(())
    }

    async fn generate(&self, _model: &str, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), params.clone()));
        if self.failing_generation {
            return Err(VideoError::Api(
                "HTTP 503 Service Unavailable: model is overloaded".to_string(),
            ));
        }
        Ok(self.output.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeSpeech {
    failing: bool,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl FakeSpeech {
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn spoken(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }
}

#[async_trait]
impl SpeechBackend for FakeSpeech {
    async fn synthesize(&self, text: &str, _voice: &VoiceConfig, output_path: &Path) -> Result<()> {
        if self.failing {
            return Err(VideoError::Api("TTS service unreachable".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        tokio::fs::write(output_path, b"ID3").await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeMedia {
    durations: HashMap<String, f64>,
    fail_concat: bool,
    rendered: Arc<Mutex<Vec<ClipPlan>>>,
}

impl FakeMedia {
    /// 按文件名指定音频时长，未指定的为 3 秒
    pub fn with_duration(mut self, file: &str, seconds: f64) -> Self {
        self.durations.insert(file.to_string(), seconds);
        self
    }

    pub fn failing_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    pub fn rendered(&self) -> Arc<Mutex<Vec<ClipPlan>>> {
        Arc::clone(&self.rendered)
    }
}

#[async_trait]
impl MediaEngine for FakeMedia {
    async fn audio_duration(&self, path: &Path) -> Result<f64> {
        Ok(self.durations.get(&file_name(path)).copied().unwrap_or(3.0))
    }

    async fn image_size(&self, _path: &Path) -> Result<(u32, u32)> {
        Ok((640, 480))
    }

    async fn render_clip(&self, clip: &ClipPlan, _canvas: Canvas, output_path: &Path) -> Result<()> {
        self.rendered.lock().unwrap().push(clip.clone());
        tokio::fs::write(output_path, b"clip").await?;
        Ok(())
    }

    async fn concat(&self, clips: &[PathBuf], _work_dir: &Path, output_path: &Path) -> Result<()> {
        if self.fail_concat {
            return Err(VideoError::Ffmpeg("FFmpeg concat failed: disk full".to_string()));
        }
        let listing: Vec<String> = clips.iter().map(|c| file_name(c)).collect();
        tokio::fs::write(output_path, listing.join("\n")).await?;
        Ok(())
    }

    async fn silence(&self, _seconds: f64, output_path: &Path) -> Result<()> {
        tokio::fs::write(output_path, b"ID3").await?;
        Ok(())
    }
}

use crate::config::{GenerationParams, ScriptConfig};
use crate::error::Result;
use crate::registry::ModelRegistry;
use crate::scene::Script;
use tracing::{info, warn};

/// 把所有图片描述串成一段连贯旁白，再按图片数量切分
pub struct ScriptSynthesizer<'a> {
    registry: &'a ModelRegistry,
    script: &'a ScriptConfig,
    generation: &'a GenerationParams,
}

impl<'a> ScriptSynthesizer<'a> {
    pub fn new(
        registry: &'a ModelRegistry,
        script: &'a ScriptConfig,
        generation: &'a GenerationParams,
    ) -> Self {
        Self {
            registry,
            script,
            generation,
        }
    }

    pub fn build_prompt(&self, captions: &[String]) -> String {
        format!(
            "{}{}",
            self.script.prompt_prefix,
            captions.join(&self.script.caption_separator)
        )
    }

    /// 模型不可用时返回 `NoTextModel`；空片段是合法结果
    pub async fn synthesize(&self, captions: &[String]) -> Result<Script> {
        let model = self.registry.text_model().await?;
        let prompt = self.build_prompt(captions);

        let text = self
            .registry
            .text_backend()
            .generate(model, &prompt, self.generation)
            .await?;
        info!("Generated narrative: {} words", text.split_whitespace().count());

        let script = Script::new(text, captions.len(), self.script.minimum_segment_size);
        let silent = script.segments.len() - script.spoken_segments();
        if silent > 0 {
            warn!(
                "Narrative is too short: {} of {} images have no narration",
                silent,
                script.segments.len()
            );
        }

        Ok(script)
    }
}

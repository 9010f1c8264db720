use super::SpeechBackend;
use crate::config::VoiceConfig;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

const TTS_RPC_ID: &str = "jQ1olc";
/// 服务端单次请求能朗读的最大字符数
const MAX_CHUNK_CHARS: usize = 100;
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Google 翻译的朗读接口（与 gTTS 相同的调用方式），输出 MP3
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: Client,
}

impl GoogleTts {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    fn endpoint(voice: &VoiceConfig) -> String {
        format!(
            "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
            voice.tld
        )
    }

    async fn synthesize_chunk(&self, chunk: &str, voice: &VoiceConfig) -> Result<Vec<u8>> {
        let payload = rpc_payload(chunk, voice)?;

        let response = self
            .client
            .post(Self::endpoint(voice))
            .header("Referer", format!("https://translate.google.{}/", voice.tld))
            .form(&[("f.req", payload)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(VideoError::SpeechSynthesis(format!(
                "TTS API error (HTTP {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        decode_audio(&body)
    }
}

#[async_trait]
impl SpeechBackend for GoogleTts {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig, output_path: &Path) -> Result<()> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(VideoError::SpeechSynthesis("No text to speak".to_string()));
        }

        let mut audio_data = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Requesting speech chunk {}/{}", i + 1, chunks.len());
            audio_data.extend(self.synthesize_chunk(chunk, voice).await?);
        }

        tokio::fs::write(output_path, audio_data).await?;
        info!("Speech saved to: {}", output_path.display());
        Ok(())
    }
}

/// 按词切分成不超过 `max_chars` 个字符的块，过长的单词按字符硬切
fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current.chars().count() + 1 + word_len
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    // 只有标点的块朗读不出内容
    chunks
        .into_iter()
        .filter(|chunk| chunk.chars().any(char::is_alphanumeric))
        .collect()
}

fn rpc_payload(chunk: &str, voice: &VoiceConfig) -> Result<String> {
    let speed = if voice.slow { json!(true) } else { Value::Null };
    let parameter = serde_json::to_string(&json!([chunk, voice.lang, speed, "null"]))?;
    let rpc = json!([[[TTS_RPC_ID, parameter, null, "generic"]]]);
    Ok(serde_json::to_string(&rpc)?)
}

fn audio_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).expect("audio pattern is a valid regex")
    })
}

/// 从 batchexecute 响应中找出 base64 编码的音频
fn decode_audio(body: &str) -> Result<Vec<u8>> {
    for line in body.lines().filter(|line| line.contains(TTS_RPC_ID)) {
        if let Some(captures) = audio_pattern().captures(line) {
            let encoded = &captures[1];
            return base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| {
                    VideoError::SpeechSynthesis(format!("Invalid audio payload: {}", e))
                });
        }
    }

    Err(VideoError::SpeechSynthesis(
        "No audio stream in TTS response".to_string(),
    ))
}

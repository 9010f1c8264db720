use serde::{Deserialize, Serialize};

/// 生成的旁白全文，以及按图片切分后的片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
    pub segments: Vec<String>,
}

impl Script {
    pub fn new(text: String, image_count: usize, minimum_segment_size: usize) -> Self {
        let segments = segment(&text, image_count, minimum_segment_size);
        Self { text, segments }
    }

    /// 非空片段的数量（即会生成音频的片段数）
    pub fn spoken_segments(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| !segment.trim().is_empty())
            .count()
    }
}

/// 按固定词数窗口切分：每张图片分到 `max(minimum, total / count)` 个词，
/// 从左到右依次分配，超出词数的图片得到空字符串。
pub fn segment(text: &str, count: usize, minimum: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let per_segment = minimum.max(words.len() / count).max(1);

    (0..count)
        .map(|i| {
            let start = i * per_segment;
            if start >= words.len() {
                return String::new();
            }
            let end = (start + per_segment).min(words.len());
            words[start..end].join(" ")
        })
        .collect()
}

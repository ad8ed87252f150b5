//! Gemini adapters for frame classification and story generation.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use pawstory_media::compress_frame;
use pawstory_models::Analysis;

use crate::error::{AiError, AiResult};
use crate::traits::{
    ChapterDraft, ClosingRequest, NarrationGenerator, PetContext, StoryDraft, StoryRequest,
    VisionAnalysis,
};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Shared Gemini transport.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> AiResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AiError::config("Gemini API key is empty"));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            api_key,
            model: model.into(),
            http,
        })
    }

    /// One generateContent call, returning the first candidate's text.
    async fn generate(&self, parts: Vec<Part>, config: GenerationConfig) -> AiResult<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_ENDPOINT, self.model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: config,
        };

        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::malformed(format!("invalid response envelope: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or(AiError::EmptyResponse)?;

        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Strip a markdown code fence if the model wrapped its JSON in one.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Frame classification via Gemini multimodal.
///
/// Frames are downscaled and JPEG-compressed before upload; this is a
/// transport concern of the adapter, the on-disk frames are untouched.
#[derive(Debug, Clone)]
pub struct GeminiVision {
    client: GeminiClient,
    max_width: u32,
    max_height: u32,
}

impl GeminiVision {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            max_width: 640,
            max_height: 360,
        }
    }

    fn build_prompt(&self, context: &PetContext) -> String {
        let subject = match (&context.pet_name, &context.pet_breed) {
            (Some(name), Some(breed)) => format!("a pet named {name} (a {breed})"),
            (Some(name), None) => format!("a pet named {name}"),
            _ => "a pet".to_string(),
        };
        format!(
            r#"These frames are consecutive stills from a home video of {subject}.
Analyze what is happening across the frames and return ONLY a JSON object with this schema:
{{
  "has_pet": true,
  "has_human": false,
  "interaction": "one of: running_towards_owner, playing, being_petted, fetching, cuddling, none",
  "emotion": "one of: happy, excited, calm, neutral, sad",
  "caption": "one short sentence describing the moment"
}}

Rules:
- "has_pet" is true only if the pet is clearly visible.
- "has_human" is true only if a person (or part of one) is visible.
- Pick "none" for interaction when the pet and human are not engaging with each other.
- Keep the caption under 15 words."#
        )
    }
}

#[async_trait]
impl VisionAnalysis for GeminiVision {
    async fn classify(&self, frames: &[PathBuf], context: &PetContext) -> AiResult<Analysis> {
        if frames.is_empty() {
            return Err(AiError::config("no frames to classify"));
        }

        let mut parts = vec![Part::Text {
            text: self.build_prompt(context),
        }];
        for frame in frames {
            let jpeg = compress_frame(frame, self.max_width, self.max_height).await?;
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: BASE64.encode(jpeg),
                },
            });
        }

        let text = self
            .client
            .generate(
                parts,
                GenerationConfig {
                    temperature: 0.4,
                    max_output_tokens: 2000,
                    response_mime_type: Some("application/json".to_string()),
                },
            )
            .await?;

        let analysis: Analysis = serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| AiError::malformed(format!("invalid analysis JSON: {e}")))?;

        debug!(frames = frames.len(), caption = %analysis.caption, "Classified frames");
        Ok(analysis)
    }
}

#[derive(Debug, Deserialize)]
struct StoryPayload {
    title: String,
    #[serde(default)]
    chapters: Vec<ChapterPayload>,
}

#[derive(Debug, Deserialize)]
struct ChapterPayload {
    narration: String,
    video_index: usize,
    highlight_index: usize,
}

/// Story and closing-statement generation via Gemini text.
#[derive(Debug, Clone)]
pub struct GeminiNarrator {
    client: GeminiClient,
}

impl GeminiNarrator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn build_story_prompt(&self, request: &StoryRequest) -> String {
        let profile = request.tone.profile();
        let breed = request
            .pet_breed
            .as_deref()
            .map(|b| format!(" ({b})"))
            .unwrap_or_default();

        let mut moments = String::new();
        for video in &request.videos {
            for (i, h) in video.highlights.iter().enumerate() {
                moments.push_str(&format!(
                    "- video_index {} / highlight_index {}: \"{}\" ({:.1}s)\n",
                    video.video_index, i, h.caption, h.duration
                ));
            }
        }

        let examples = profile
            .examples
            .iter()
            .map(|e| format!("  \"{e}\""))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are writing a short narrated story about {name}{breed}, told for their {owner}.

Voice: {style}
Register: {register}
Example lines in this voice:
{examples}

These moments were detected in the home videos:
{moments}
Write a story of exactly {count} chapters. Each chapter narrates one of the moments above.
Return ONLY a JSON object with this schema:
{{
  "title": "Story title",
  "chapters": [
    {{"narration": "2-3 sentences in the voice above", "video_index": 0, "highlight_index": 0}}
  ]
}}

Rules:
- Use each video_index/highlight_index pair exactly as listed above.
- Order chapters to tell a coherent story arc.
- Keep each narration under 40 words so it fits the clip."#,
            name = request.pet_name,
            owner = request.owner_title,
            style = profile.style,
            register = profile.register,
            count = request.chapter_count,
        )
    }

    fn build_closing_prompt(&self, request: &ClosingRequest) -> String {
        let profile = request.tone.profile();

        let mut memories = String::new();
        for narration in &request.chapter_narrations {
            memories.push_str(&format!("- {narration}\n"));
        }

        format!(
            r#"The story "{title}" was just told about {name}. Its chapters:
{memories}
After watching it, {name}'s {owner} wrote this message to them:
"{message}"

Voice: {style}

Write {name}'s reply in one or two short sentences, 40 to 60 characters total.
Echo the shared memories above where they fit.
Return ONLY the reply text, no quotes, no JSON."#,
            title = request.story_title,
            name = request.pet_name,
            owner = request.owner_title,
            message = request.owner_message,
            style = profile.style,
        )
    }
}

#[async_trait]
impl NarrationGenerator for GeminiNarrator {
    async fn generate_story(&self, request: &StoryRequest) -> AiResult<StoryDraft> {
        let prompt = self.build_story_prompt(request);
        let text = self
            .client
            .generate(
                vec![Part::Text { text: prompt }],
                GenerationConfig {
                    temperature: 0.4,
                    max_output_tokens: 2000,
                    response_mime_type: Some("application/json".to_string()),
                },
            )
            .await?;

        let payload: StoryPayload = serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| AiError::malformed(format!("invalid story JSON: {e}")))?;

        if payload.chapters.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        info!(
            title = %payload.title,
            chapters = payload.chapters.len(),
            "Generated story"
        );
        Ok(StoryDraft {
            title: payload.title,
            chapters: payload
                .chapters
                .into_iter()
                .map(|c| ChapterDraft {
                    narration: c.narration,
                    video_index: c.video_index,
                    highlight_index: c.highlight_index,
                })
                .collect(),
        })
    }

    async fn generate_closing(&self, request: &ClosingRequest) -> AiResult<String> {
        let prompt = self.build_closing_prompt(request);
        let text = self
            .client
            .generate(
                vec![Part::Text { text: prompt }],
                GenerationConfig {
                    temperature: 0.4,
                    max_output_tokens: 200,
                    response_mime_type: None,
                },
            )
            .await?;

        Ok(text.trim_matches('"').trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_analysis_payload_parses_into_model() {
        let json = r#"{
            "has_pet": true,
            "has_human": true,
            "interaction": "playing",
            "emotion": "excited",
            "caption": "The dog chases a ball across the yard"
        }"#;
        let analysis: Analysis = serde_json::from_str(json).unwrap();
        assert!(analysis.is_qualifying());
    }

    #[test]
    fn test_story_payload_parses() {
        let json = r#"{
            "title": "A Day With Biscuit",
            "chapters": [
                {"narration": "I ran so fast!", "video_index": 0, "highlight_index": 1}
            ]
        }"#;
        let payload: StoryPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.chapters[0].highlight_index, 1);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(GeminiClient::new("", "gemini-2.0-flash", 60).is_err());
    }

    #[test]
    fn test_closing_prompt_carries_the_story() {
        let narrator = GeminiNarrator::new(
            GeminiClient::new("key", "gemini-2.0-flash", 30).unwrap(),
        );
        let request = ClosingRequest {
            pet_name: "Biscuit".to_string(),
            owner_title: "mom".to_string(),
            owner_message: "Thank you for eight wonderful years.".to_string(),
            tone: pawstory_models::ToneMode::Heartfelt,
            story_title: "Eight Summers".to_string(),
            chapter_narrations: vec![
                "I ran so fast my ears flew.".to_string(),
                "Napping next to you was my favourite.".to_string(),
            ],
        };

        let prompt = narrator.build_closing_prompt(&request);
        assert!(prompt.contains("Eight Summers"));
        assert!(prompt.contains("I ran so fast my ears flew."));
        assert!(prompt.contains("Napping next to you was my favourite."));
        assert!(prompt.contains("Thank you for eight wonderful years."));
    }
}

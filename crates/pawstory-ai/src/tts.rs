//! Google Cloud Text-to-Speech adapter.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AiError, AiResult};
use crate::traits::{SpeechSynthesizer, VoiceProfile};

const TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    input: TtsInput<'a>,
    voice: TtsVoice<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: TtsAudioConfig,
}

#[derive(Debug, Serialize)]
struct TtsInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct TtsVoice<'a> {
    #[serde(rename = "languageCode")]
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct TtsAudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: &'static str,
    #[serde(rename = "speakingRate")]
    speaking_rate: f64,
    pitch: f64,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    #[serde(rename = "audioContent")]
    audio_content: Option<String>,
}

/// [`SpeechSynthesizer`] backed by the Google Cloud TTS REST API.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    api_key: String,
    http: Client,
}

impl GoogleTts {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> AiResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AiError::config("TTS API key is empty"));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { api_key, http })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> AiResult<Vec<u8>> {
        let url = format!("{}?key={}", TTS_ENDPOINT, self.api_key);
        let request = TtsRequest {
            input: TtsInput { text },
            voice: TtsVoice {
                language_code: &voice.language_code,
                name: &voice.name,
            },
            audio_config: TtsAudioConfig {
                audio_encoding: "MP3",
                speaking_rate: voice.speaking_rate,
                pitch: voice.pitch,
            },
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

        let parsed: TtsResponse = response
            .json()
            .await
            .map_err(|e| AiError::malformed(format!("invalid TTS envelope: {e}")))?;

        let encoded = parsed.audio_content.ok_or(AiError::EmptyResponse)?;
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| AiError::malformed(format!("invalid audio base64: {e}")))?;

        if bytes.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        debug!(chars = text.len(), bytes = bytes.len(), "Synthesized speech");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(GoogleTts::new("", 30).is_err());
    }

    #[test]
    fn test_response_decodes_audio() {
        let json = format!(r#"{{"audioContent": "{}"}}"#, BASE64.encode(b"mp3data"));
        let parsed: TtsResponse = serde_json::from_str(&json).unwrap();
        let bytes = BASE64.decode(parsed.audio_content.unwrap()).unwrap();
        assert_eq!(bytes, b"mp3data");
    }
}

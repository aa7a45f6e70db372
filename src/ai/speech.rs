//! Optional text-to-speech rendition of assistant replies.

use super::gemini::GeminiService;
use crate::config::Config;
use crate::error::CivisError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use std::sync::Arc;

/// PCM layout returned by the Gemini TTS models.
pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns raw little-endian 16-bit mono PCM.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CivisError>;
}

pub struct GeminiSpeech {
    service: GeminiService,
    model: String,
    voice: String,
}

impl GeminiSpeech {
    pub fn new(service: GeminiService, config: &Config) -> Self {
        Self { service, model: config.tts_model.clone(), voice: config.voice.clone() }
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CivisError> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.voice } }
                }
            }
        });

        let body = self
            .service
            .post(&self.model, &payload)
            .await
            .map_err(|e| CivisError::SpeechSynthesis(e.to_string()))?;

        let data = body["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
            .as_str()
            .ok_or_else(|| CivisError::SpeechSynthesis("no audio returned".into()))?;

        STANDARD
            .decode(data)
            .map_err(|e| CivisError::SpeechSynthesis(format!("audio payload: {e}")))
    }
}

/// Wraps PCM samples in a RIFF/WAVE container.
pub fn encode_wav(pcm: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

pub fn wav_data_uri(wav: &[u8]) -> String {
    format!("data:audio/wav;base64,{}", STANDARD.encode(wav))
}

/// Renders `text` to a playable data URI. Any failure is logged and yields
/// `None` so the caller can still deliver the text.
pub async fn render_reply(synth: &Arc<dyn SpeechSynthesizer>, text: &str) -> Option<String> {
    match synth.synthesize(text).await {
        Ok(pcm) if !pcm.is_empty() => {
            let wav = encode_wav(&pcm, SAMPLE_RATE, CHANNELS, BITS_PER_SAMPLE);
            Some(wav_data_uri(&wav))
        }
        Ok(_) => {
            log::warn!("🔇 Speech synthesis returned no samples; replying with text only");
            None
        }
        Err(e) => {
            log::warn!("🔇 Speech synthesis failed, replying with text only: {e}");
            None
        }
    }
}

//! Simulated text-to-speech and speech-to-text.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::io::Cursor;
use uuid::Uuid;

use crate::domain::models::TaskContext;
use crate::domain::ports::Handler;

const SAMPLE_RATE: u32 = 16_000;

/// Offline voice handler.
///
/// `speak`/`tts` return one second of silence as a base64 WAV; `transcribe`/
/// `stt` return a deterministic transcript and the input byte count.
#[derive(Debug)]
pub struct VoiceHandler {
    session_id: String,
}

enum VoiceAction {
    Speak,
    Transcribe,
}

impl VoiceHandler {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().simple().to_string(),
        }
    }

    fn action(task: &str, context: &TaskContext) -> Option<VoiceAction> {
        let explicit = context
            .get("action")
            .and_then(Value::as_str)
            .map(|a| a.trim().to_lowercase())
            .unwrap_or_default();
        let lower = task.to_lowercase();

        if matches!(explicit.as_str(), "speak" | "tts")
            || ["speak", "tts", "text to speech"].iter().any(|kw| lower.contains(kw))
        {
            Some(VoiceAction::Speak)
        } else if matches!(explicit.as_str(), "transcribe" | "stt")
            || ["transcribe", "stt", "speech to text"].iter().any(|kw| lower.contains(kw))
        {
            Some(VoiceAction::Transcribe)
        } else {
            None
        }
    }

    fn speak(context: &TaskContext) -> anyhow::Result<Value> {
        let text = context.get("text").and_then(Value::as_str).unwrap_or("");
        if text.is_empty() {
            return Ok(json!({
                "error": "No text provided for TTS.",
                "hint": "Pass a non-empty 'text' field in context.",
            }));
        }

        let wav = silent_wav(SAMPLE_RATE)?;
        Ok(json!({
            "status": "simulated",
            "text": text,
            "audio_base64": STANDARD.encode(wav),
            "content_type": "audio/wav",
        }))
    }

    async fn transcribe(&self, context: &TaskContext) -> Value {
        let audio_base64 = context.get("audio_base64").and_then(Value::as_str);
        let audio_path = context.get("audio_path").and_then(Value::as_str);

        let audio = match (audio_base64, audio_path) {
            (Some(_), Some(_)) => {
                return json!({
                    "error": "Provide only one of audio_base64 or audio_path, not both.",
                    "hint": "Provide exactly one audio input in context.",
                })
            }
            (Some(encoded), None) => match STANDARD.decode(encoded) {
                Ok(bytes) => bytes,
                Err(_) => {
                    return json!({
                        "error": "Invalid audio_base64 payload.",
                        "hint": "Provide base64-encoded audio bytes.",
                    })
                }
            },
            (None, Some(path)) => match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return json!({
                        "error": format!("Unable to read audio_path: {path}"),
                        "hint": "Provide a readable file path in 'audio_path'.",
                    })
                }
            },
            (None, None) => {
                return json!({
                    "error": "No audio provided for transcription.",
                    "hint": "Provide exactly one of 'audio_base64' or 'audio_path' in context.",
                })
            }
        };

        json!({
            "status": "simulated",
            "text": format!("(simulated transcript {})", self.session_id),
            "bytes": audio.len(),
        })
    }
}

impl Default for VoiceHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Mono 16-bit PCM silence, `samples` frames long.
fn silent_wav(samples: u32) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for _ in 0..samples.max(1) {
            writer.write_sample(0i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[async_trait]
impl Handler for VoiceHandler {
    fn name(&self) -> &str {
        "voice"
    }

    async fn execute(&self, task: &str, context: &TaskContext) -> anyhow::Result<Value> {
        match Self::action(task, context) {
            Some(VoiceAction::Speak) => Self::speak(context),
            Some(VoiceAction::Transcribe) => Ok(self.transcribe(context).await),
            None => Ok(json!({
                "error": format!("Voice task not recognized: '{task}'"),
                "hint": "Use an 'action' of 'speak' or 'transcribe' in context.",
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(value: Value) -> TaskContext {
        let Value::Object(map) = value else {
            panic!("context must be an object");
        };
        map
    }

    #[tokio::test]
    async fn test_speak_returns_valid_wav() {
        let result = VoiceHandler::new()
            .execute("speak", &context(json!({"text": "hello"})))
            .await
            .unwrap();

        assert_eq!(result["status"], "simulated");
        let bytes = STANDARD
            .decode(result["audio_base64"].as_str().unwrap())
            .unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.duration(), SAMPLE_RATE);
    }

    #[tokio::test]
    async fn test_speak_without_text() {
        let result = VoiceHandler::new()
            .execute("tts please", &TaskContext::new())
            .await
            .unwrap();
        assert_eq!(result["error"], "No text provided for TTS.");
    }

    #[tokio::test]
    async fn test_action_overrides_task_text() {
        let result = VoiceHandler::new()
            .execute(
                "do the voice thing",
                &context(json!({"action": "Transcribe", "audio_base64": "AAAA"})),
            )
            .await
            .unwrap();
        assert_eq!(result["bytes"], 3);
    }

    #[tokio::test]
    async fn test_transcribe_is_deterministic_per_instance() {
        let handler = VoiceHandler::new();
        let ctx = context(json!({"audio_base64": "AAAA"}));

        let first = handler.execute("transcribe", &ctx).await.unwrap();
        let second = handler.execute("stt", &ctx).await.unwrap();

        assert_eq!(first["text"], second["text"]);
    }

    #[tokio::test]
    async fn test_transcribe_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [1u8, 2, 3, 4, 5]).unwrap();

        let result = VoiceHandler::new()
            .execute(
                "transcribe",
                &context(json!({"audio_path": file.path().to_str().unwrap()})),
            )
            .await
            .unwrap();

        assert_eq!(result["bytes"], 5);
    }

    #[tokio::test]
    async fn test_transcribe_input_errors() {
        let handler = VoiceHandler::new();

        let both = handler
            .execute("transcribe", &context(json!({"audio_base64": "AA==", "audio_path": "x"})))
            .await
            .unwrap();
        assert!(both["error"].as_str().unwrap().contains("only one"));

        let invalid = handler
            .execute("transcribe", &context(json!({"audio_base64": "not base64!"})))
            .await
            .unwrap();
        assert_eq!(invalid["error"], "Invalid audio_base64 payload.");

        let missing = handler.execute("transcribe", &TaskContext::new()).await.unwrap();
        assert_eq!(missing["error"], "No audio provided for transcription.");
    }

    #[tokio::test]
    async fn test_unrecognised_task() {
        let result = VoiceHandler::new()
            .execute("voice", &TaskContext::new())
            .await
            .unwrap();
        assert!(result["hint"].is_string());
    }
}

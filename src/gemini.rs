use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::persona::PersonaSettings;
use crate::prompt;
use crate::reply::ReplyOption;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Failure taxonomy for one generation attempt. The UI collapses all of these
/// into a single generic message; the variants exist so the distinction is
/// not lost internally.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("GEMINI_API_KEY is not set in the environment")]
    MissingApiKey,
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini API error {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },
    #[error("Gemini returned a malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("generation task aborted before completing")]
    Aborted,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiSystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

/// The shape the model is constrained to. `options` becomes the returned
/// list; a missing field after parse degrades to an empty list.
#[derive(Deserialize)]
struct ReplyPayload {
    #[serde(default)]
    options: Vec<ReplyOption>,
}

/// Response schema sent with every request so the model returns machine
/// parseable JSON instead of prose.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "options": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": {
                            "type": "STRING",
                            "enum": ["Standard", "Intense", "Short"],
                            "description": "The category of the response style."
                        },
                        "label": {
                            "type": "STRING",
                            "description": "A short label description in Chinese (e.g., 完美符合人设, 情绪更强烈, 简短敷衍)."
                        },
                        "content": {
                            "type": "STRING",
                            "description": "The actual message content to send."
                        },
                        "explanation": {
                            "type": "STRING",
                            "description": "A very brief inner thought or explanation (OS)."
                        }
                    },
                    "required": ["type", "label", "content"]
                }
            }
        },
        "required": ["options"]
    })
}

impl GeminiClient {
    /// Read the credential from the environment. Absence is a configuration
    /// error raised here, before any network call is attempted.
    pub fn from_env() -> Result<Self, GenerateError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerateError::MissingApiKey)?;

        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// One structured-output call, single attempt, no retry and no caching.
    /// An empty response body is a valid result (no cards), not an error.
    pub async fn generate_replies(
        &self,
        persona: &PersonaSettings,
        incoming_message: &str,
        intent: &str,
    ) -> Result<Vec<ReplyOption>, GenerateError> {
        let (system_instruction, user_prompt) = prompt::build(persona, incoming_message, intent);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiTextPart { text: user_prompt }],
            }],
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiTextPart {
                    text: system_instruction.to_string(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                // High temperature on purpose: varied, human-sounding phrasing
                // matters more here than reproducibility.
                temperature: 1.0,
            },
        };

        let url = format!("{}?key={}", GEMINI_API_URL, self.api_key);

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api { status, body });
        }

        let body = response.text().await?;
        let api_response: GeminiResponse = serde_json::from_str(&body)?;

        if let Some(error) = api_response.error {
            return Err(GenerateError::Api {
                status: reqwest::StatusCode::OK,
                body: error.message,
            });
        }

        let text = extract_text(api_response);
        parse_reply_payload(&text)
    }
}

/// Concatenate the text parts of the first candidate. Gemini splits long
/// outputs across parts even in JSON mode.
fn extract_text(response: GeminiResponse) -> String {
    let mut text = String::new();
    if let Some(candidates) = response.candidates {
        if let Some(candidate) = candidates.into_iter().next() {
            for part in candidate.content.parts {
                if let Some(t) = part.text {
                    text.push_str(&t);
                }
            }
        }
    }
    text
}

/// Decode the schema-constrained payload. Empty body is the designed
/// soft-empty case; anything non-empty must parse or the request fails.
pub(crate) fn parse_reply_payload(text: &str) -> Result<Vec<ReplyOption>, GenerateError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let payload: ReplyPayload = serde_json::from_str(text)?;
    Ok(payload.options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ReplyCategory;

    #[test]
    fn test_parse_single_option_round_trip() {
        let options =
            parse_reply_payload(r#"{"options":[{"type":"Standard","label":"L","content":"C"}]}"#)
                .unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].category, ReplyCategory::Standard);
        assert_eq!(options[0].label, "L");
        assert_eq!(options[0].content, "C");
        assert_eq!(options[0].explanation, None);
    }

    #[test]
    fn test_parse_empty_body_is_empty_list() {
        assert!(parse_reply_payload("").unwrap().is_empty());
        assert!(parse_reply_payload("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_missing_options_field_is_empty_list() {
        assert!(parse_reply_payload("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_body_is_parse_error() {
        let err = parse_reply_payload("not json at all").unwrap_err();
        assert!(matches!(err, GenerateError::Parse(_)));
    }

    #[test]
    fn test_parse_preserves_option_order() {
        let options = parse_reply_payload(
            r#"{"options":[
                {"type":"Standard","label":"a","content":"1"},
                {"type":"Intense","label":"b","content":"2"},
                {"type":"Short","label":"c","content":"3"}
            ]}"#,
        )
        .unwrap();
        let categories: Vec<_> = options.iter().map(|o| o.category).collect();
        assert_eq!(
            categories,
            vec![ReplyCategory::Standard, ReplyCategory::Intense, ReplyCategory::Short]
        );
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response = GeminiResponse {
            candidates: Some(vec![GeminiCandidate {
                content: GeminiCandidateContent {
                    parts: vec![
                        GeminiPartResponse { text: Some("{\"options\"".to_string()) },
                        GeminiPartResponse { text: Some(":[]}".to_string()) },
                        GeminiPartResponse { text: None },
                    ],
                },
            }]),
            error: None,
        };
        assert_eq!(extract_text(response), "{\"options\":[]}");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response = GeminiResponse { candidates: None, error: None };
        assert_eq!(extract_text(response), "");
    }

    #[test]
    fn test_from_env_without_key_fails_fast() {
        std::env::remove_var("GEMINI_API_KEY");
        assert!(matches!(GeminiClient::from_env(), Err(GenerateError::MissingApiKey)));
    }
}

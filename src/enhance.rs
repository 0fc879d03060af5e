use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = r#"You write on-screen copy for short vertical videos.

Return a JSON object with exactly two keys:
"title": a short, punchy headline of 5 to 10 words.
"body": the input text, unchanged in meaning, with only 2 to 4 of its most important words or phrases wrapped in **double asterisks**.

Highlight action words, benefits or emotional hooks. Never highlight filler words such as "and", "the", "for", "to", "a".
Reply with the JSON object only.

Input: "Learn how to make passive income online with our proven strategies for beginners"
Output: {"title": "Passive Income Made Simple", "body": "Learn how to make **passive income** online with our **proven strategies** for beginners"}"#;

/// Title plus body (possibly carrying `**bold**` markup).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Enhanced {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Enhanced {
    pub fn passthrough(text: &str) -> Self {
        Self {
            title: String::new(),
            body: text.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Client for the chat-completions text enhancer. Every failure degrades
/// to returning the input text untouched.
#[derive(Debug, Clone)]
pub struct TextEnhancer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl TextEnhancer {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            endpoint: GROQ_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn enhance(&self, text: &str) -> Enhanced {
        if text.trim().is_empty() {
            return Enhanced::passthrough(text);
        }
        let Some(key) = self.api_key.as_deref() else {
            warn!("No text-enhancement API key configured, keeping text as is");
            return Enhanced::passthrough(text);
        };

        info!(
            "Enhancing text: {}",
            text.chars().take(50).collect::<String>()
        );
        match self.request(key, text).await {
            Ok(content) => {
                let enhanced = parse_completion(&content, text);
                debug!("Enhanced title: {}", enhanced.title);
                enhanced
            }
            Err(e) => {
                warn!("Text enhancement failed: {:#}", e);
                Enhanced::passthrough(text)
            }
        }
    }

    async fn request(&self, key: &str, text: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.4,
            max_tokens: 600,
        };
        let res: ChatResponse = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let choice = res
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("completion had no choices"))?;
        Ok(choice.message.content.trim().to_string())
    }
}

/// Parse the model reply, tolerating markdown code fences. A reply that is
/// not the expected JSON object leaves `original` untouched.
pub fn parse_completion(content: &str, original: &str) -> Enhanced {
    let cleaned = content.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    match serde_json::from_str::<Enhanced>(cleaned) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Enhancement reply was not JSON ({}), keeping text as is", e);
            Enhanced::passthrough(original)
        }
    }
}

//! Tag translation through a local Ollama model.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ensure_success;
use crate::config::OracleConfig;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Translates OSM tag values into search-friendly terms
pub struct Oracle {
    client: Client,
    config: OracleConfig,
}

impl Oracle {
    pub fn new(client: Client, config: OracleConfig) -> Self {
        Self { client, config }
    }

    /// Ask the model for a translation of `term`
    pub async fn translate(&self, term: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.config.url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: term,
            }],
            stream: false,
        };

        let response = ensure_success(self.client.post(&url).json(&request).send().await?)?;
        let reply: ChatResponse = response.json().await?;
        Ok(reply.message.content.trim().to_string())
    }

    /// Best effort: the untranslated term if the oracle is off, fails or says nothing
    pub async fn translate_or_keep(&self, term: &str) -> String {
        if !self.config.enabled {
            return term.to_string();
        }
        match self.translate(term).await {
            Ok(translated) if !translated.is_empty() => {
                debug!("Translated '{}' -> '{}'", term, translated);
                translated
            }
            Ok(_) => term.to_string(),
            Err(e) => {
                warn!("Translation of '{}' failed ({}), searching untranslated", term, e);
                term.to_string()
            }
        }
    }
}

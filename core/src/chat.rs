//! Client for the `/chat` assistant endpoint and a transcript to go with it.
//!
//! The endpoint is opaque: no retries, no backoff. Whatever happens, the
//! caller gets a line of text to show.

use tracing::error;

use crate::client::json_headers;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{ChatRequest, ChatResponse};

pub const GREETING: &str = "Hi! I'm here to help you stay organized and productive. \
Ask me anything about managing your tasks or building better habits.";

/// Shown when the server answered without `reply` or `error`.
pub const NO_REPLY: &str = "Sorry, I couldn't process that request.";

/// Shown when the server could not be reached or did not answer with JSON.
pub const UNREACHABLE: &str =
    "I'm having trouble connecting right now. Please make sure the backend is running.";

#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_send(&self, message: &str) -> Result<HttpRequest, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::Validation("message must not be empty".to_string()));
        }
        let body = serde_json::to_string(&ChatRequest {
            message: message.to_string(),
        })
        .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/chat", self.base_url),
            headers: json_headers(),
            body: Some(body),
        })
    }

    /// Turn whatever came back into the text to display. Any status is
    /// accepted as long as the body is the chat JSON.
    pub fn parse_reply(&self, response: Result<HttpResponse, ApiError>) -> String {
        let parsed = response.and_then(|r| {
            serde_json::from_str::<ChatResponse>(&r.body)
                .map_err(|e| ApiError::Decode(e.to_string()))
        });
        match parsed {
            Ok(ChatResponse { reply: Some(reply), .. }) if !reply.is_empty() => reply,
            Ok(ChatResponse { error: Some(error), .. }) if !error.is_empty() => error,
            Ok(_) => NO_REPLY.to_string(),
            Err(e) => {
                error!("Error connecting to chat backend: {}", e);
                UNREACHABLE.to_string()
            }
        }
    }

    /// Send one message and return the text to display.
    pub fn send<T: Transport>(&self, message: &str, transport: &T) -> Result<String, ApiError> {
        let request = self.build_send(message)?;
        Ok(self.parse_reply(transport.execute(&request)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: usize,
    pub author: Author,
    pub text: String,
}

/// Conversation transcript, opened by the assistant's greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        let mut log = Self { messages: Vec::new() };
        log.push(Author::Assistant, GREETING);
        log
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn push(&mut self, author: Author, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            id: self.messages.len() + 1,
            author,
            text: text.into(),
        });
    }

    /// Record the user's message, ask the assistant, and record its answer.
    /// Blank messages are ignored and return `None`.
    pub fn ask<T: Transport>(
        &mut self,
        client: &ChatClient,
        message: &str,
        transport: &T,
    ) -> Option<&ChatMessage> {
        let request = client.build_send(message).ok()?;
        self.push(Author::User, message);
        let reply = client.parse_reply(transport.execute(&request));
        self.push(Author::Assistant, reply);
        self.messages.last()
    }
}

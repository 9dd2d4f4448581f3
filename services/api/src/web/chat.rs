//! services/api/src/web/chat.rs
//!
//! Chat relay endpoint. Assembles the prior turns and the new prompt into a
//! single outbound prompt and forwards it to the configured AI provider.
//!
//! Provider failures are never surfaced as transport errors: the response is
//! always 200 with a `success` flag the caller must check.

use axum::{extract::State, response::Json};
use qualitybot_core::domain::ChatTurn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub prompt: String,
    pub user_role: Option<String>,
    pub language: Option<String>,
    /// Prior turns, each `{type: "user"|"bot", content}`.
    #[schema(value_type = Option<Vec<Object>>)]
    pub history: Option<Vec<ChatTurn>>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /chat - Relay a prompt (plus history) to the AI provider.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply text, or a failure envelope with success=false", body = ChatResponse)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let Some(chat) = state.chat.as_ref() else {
        return Json(ChatResponse {
            response: "❌ AI provider API key is not configured. Please set OPENAI_API_KEY and restart the server.".to_string(),
            success: false,
        });
    };

    let full_prompt = build_full_prompt(
        req.history.as_deref(),
        req.user_role.as_deref(),
        req.language.as_deref(),
        &req.prompt,
    );

    match chat.generate_reply(&full_prompt).await {
        Ok(text) => Json(ChatResponse {
            response: text,
            success: true,
        }),
        Err(e) => {
            error!("AI provider call failed: {:?}", e);
            Json(ChatResponse {
                response: format!("❌ Error: {}", e),
                success: false,
            })
        }
    }
}

/// Concatenates prior turns and the role/language-annotated instruction into
/// the single prompt sent to the provider.
fn build_full_prompt(
    history: Option<&[ChatTurn]>,
    user_role: Option<&str>,
    language: Option<&str>,
    prompt: &str,
) -> String {
    let mut full_prompt = String::new();
    if let Some(turns) = history {
        for turn in turns {
            match turn.kind.as_str() {
                "user" => {
                    full_prompt.push_str(&format!("User: {}\n", turn.content));
                }
                "bot" => {
                    full_prompt.push_str(&format!("AI: {}\n", turn.content));
                }
                _ => {}
            }
        }
    }

    full_prompt.push_str(&format!(
        "As QualityBot AI (user role: {}, language: {}), clearly answer: {}",
        user_role.unwrap_or("None"),
        language.unwrap_or("None"),
        prompt
    ));
    full_prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(kind: &str, content: &str) -> ChatTurn {
        ChatTurn {
            kind: kind.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn prompt_without_history_or_context() {
        let prompt = build_full_prompt(None, None, None, "What is SPC?");
        assert_eq!(
            prompt,
            "As QualityBot AI (user role: None, language: None), clearly answer: What is SPC?"
        );
    }

    #[test]
    fn history_turns_are_prefixed_and_ordered() {
        let history = vec![
            turn("user", "Hello"),
            turn("bot", "Hi, how can I help?"),
            turn("note", "should be ignored"),
        ];
        let prompt = build_full_prompt(
            Some(&history),
            Some("engineer"),
            Some("en"),
            "Explain control charts",
        );
        assert_eq!(
            prompt,
            "User: Hello\nAI: Hi, how can I help?\nAs QualityBot AI (user role: engineer, language: en), clearly answer: Explain control charts"
        );
    }
}

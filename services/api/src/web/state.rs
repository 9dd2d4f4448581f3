//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::broadcast::BroadcastHub;
use crate::web::tokens::TokenConfig;
use qualitybot_core::ports::{ChatService, UserStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<Config>,
    pub tokens: TokenConfig,
    /// Absent when no API key is configured; the chat endpoint then returns
    /// a success-enveloped failure instead of erroring.
    pub chat: Option<Arc<dyn ChatService>>,
    pub hub: Arc<BroadcastHub>,
}

pub mod auth;
pub mod broadcast;
pub mod chat;
pub mod import;
pub mod middleware;
pub mod password;
pub mod rest;
pub mod state;
pub mod tokens;
pub mod ws_handler;

// Re-export the pieces the server binary wires together.
pub use middleware::require_auth;
pub use rest::root_handler;
pub use ws_handler::ws_handler;

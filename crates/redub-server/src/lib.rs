//! HTTP surface: the dub request endpoint, locally served audio, health,
//! and the stale-file sweeper.

pub mod handlers;
pub mod server;
pub mod sweep;

pub use server::{build_router, start, AppState, DubService, ServerConfig, ServerHandle};

use std::sync::Arc;

use mediagen_db::JobStore;
use mediagen_worker::Dispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Job record store.
    pub store: Arc<dyn JobStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Hands accepted jobs to the worker pool.
    pub dispatcher: Dispatcher,
}

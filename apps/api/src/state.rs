use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Rendering is pure, so the only shared state is configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

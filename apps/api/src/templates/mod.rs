// Template API: the HTTP face of the substitution engine.
// Handlers stay thin; all request shaping lives in `service`.

pub mod handlers;
pub mod service;

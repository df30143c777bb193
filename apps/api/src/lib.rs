pub mod config;
pub mod document;
pub mod errors;
pub mod fields;
pub mod routes;
pub mod state;
pub mod substitution;
pub mod templates;

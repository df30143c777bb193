use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on a request body, which bounds the document being rendered.
    pub max_template_bytes: usize,
    /// Default for the render request's `collapse_blank_lines` flag.
    pub collapse_blank_lines: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_template_bytes: 1024 * 1024,
            collapse_blank_lines: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: optional_env("PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(defaults.port),
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            max_template_bytes: optional_env("MAX_TEMPLATE_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_TEMPLATE_BYTES must be a byte count")?
                .unwrap_or(defaults.max_template_bytes),
            collapse_blank_lines: optional_env("COLLAPSE_BLANK_LINES")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("COLLAPSE_BLANK_LINES must be true, false, 1 or 0")?
                .unwrap_or(defaults.collapse_blank_lines),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => anyhow::bail!("unrecognized flag value '{other}'"),
    }
}

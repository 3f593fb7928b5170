use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "qwen/qwen2.5-vl-72b-instruct:free";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_REFERER: &str = "https://plant-disease-detector.streamlit.app";
pub const DEFAULT_TITLE: &str = "Plant Disease Detector";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024; // 200MB

/// Everything the server needs to know before it accepts the first upload.
///
/// Built once in `main` and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub structured_output: bool,
    pub referer: String,
    pub title: String,
    /// Target language for the translated diagnosis; `None` disables translation.
    pub translation_language: Option<String>,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source so tests don't touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENROUTER_API_KEY")
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY not set"))?;

        let max_tokens = match var("VISION_MAX_TOKENS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("VISION_MAX_TOKENS is not a valid integer: {}", v))?,
            None => DEFAULT_MAX_TOKENS,
        };

        let structured_output = match var("VISION_STRUCTURED_OUTPUT") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| anyhow!("VISION_STRUCTURED_OUTPUT must be true or false, got {}", v))?,
            None => false,
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: {}", bind_addr))?;

        let max_upload_bytes = match var("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a valid size: {}", v))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            api_key,
            base_url: var("VISION_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("VISION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            structured_output,
            referer: var("APP_REFERER").unwrap_or_else(|| DEFAULT_REFERER.to_string()),
            title: var("APP_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            translation_language: var("TRANSLATION_LANGUAGE").map(|l| l.trim().to_string()),
            bind_addr,
            max_upload_bytes,
        })
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

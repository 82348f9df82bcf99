//! Process configuration loaded from environment variables.

use std::env;

use lazy_regex::regex_is_match;

use crate::domain::rules::MATCH_TTL_SECS;
use crate::error::AppError;

const DEFAULT_MAX_JSON_PAYLOAD_SIZE: usize = 64 * 1024;
const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub max_json_payload_size: usize,
    pub cors_allowed_origins: Vec<String>,

    // Match store; in-memory when unset
    pub redis_url: Option<String>,
    pub match_ttl_secs: u64,

    // Chain gateway
    pub chain_gateway_url: Option<String>,
    pub gateway_timeout_ms: u64,
    /// Game contract address, lowercase. Namespaces store keys and seeds.
    pub game_address: String,

    /// Shared secret for `/api/finalize`; unchecked when unset.
    pub api_key: Option<String>,
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match optional(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{name} is not valid, got '{raw}'"))),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let host = optional("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parsed::<u16>("BACKEND_PORT", 3001)?;
        let max_json_payload_size =
            parsed::<usize>("MAX_JSON_PAYLOAD_SIZE", DEFAULT_MAX_JSON_PAYLOAD_SIZE)?;
        let cors_allowed_origins = optional("CORS_ALLOWED_ORIGINS")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        let redis_url = optional("REDIS_URL");
        let match_ttl_secs = parsed::<u64>("MATCH_TTL_SECS", MATCH_TTL_SECS)?;
        if match_ttl_secs == 0 {
            return Err(AppError::config("MATCH_TTL_SECS must be positive"));
        }

        let chain_gateway_url = optional("CHAIN_GATEWAY_URL")
            .map(|url| url.trim_end_matches('/').to_string());
        if let Some(url) = &chain_gateway_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::config(format!(
                    "CHAIN_GATEWAY_URL must be an http(s) URL, got '{url}'"
                )));
            }
        }
        let gateway_timeout_ms = parsed::<u64>("CHAIN_GATEWAY_TIMEOUT_MS", DEFAULT_GATEWAY_TIMEOUT_MS)?;

        let game_address = optional("GAME_ADDRESS")
            .ok_or_else(|| AppError::config("GAME_ADDRESS must be set"))?
            .to_ascii_lowercase();
        if !regex_is_match!(r"^0x[0-9a-f]{40}$", &game_address) {
            return Err(AppError::config(format!(
                "GAME_ADDRESS must be a 0x-prefixed 20-byte hex address, got '{game_address}'"
            )));
        }

        let api_key = optional("API_KEY");

        Ok(Config {
            host,
            port,
            max_json_payload_size,
            cors_allowed_origins,
            redis_url,
            match_ttl_secs,
            chain_gateway_url,
            gateway_timeout_ms,
            game_address,
            api_key,
        })
    }
}

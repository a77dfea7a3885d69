use std::net::SocketAddr;

use crate::error::AppError;

/// How the server talks to its clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// REST API over HTTP.
    Http,
    /// MCP JSON-RPC on stdin/stdout.
    Stdio,
}

/// Application configuration loaded explicitly from environment variables.
///
/// Only the LanceDB path is required. Everything else has a default matching a local
/// Ollama deployment; Redis is optional and its absence disables caching.
#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem path to the LanceDB data directory.
    pub lancedb_path: String,
    /// Redis connection URL. `None` disables caching.
    pub redis_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub transport: Transport,
    /// Collection used when a request names none.
    pub default_collection: String,
    /// Chat model passed to the completions endpoint.
    pub chat_model: String,
    pub retrieval_top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `LANCEDB_PATH`: path to LanceDB data directory
    ///
    /// Optional:
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    /// - `RAG_BIND_ADDR` (default `0.0.0.0:8000`), `RAG_TRANSPORT` (`http` or `stdio`)
    /// - `DEFAULT_COLLECTION`, `CHAT_MODEL`, `RETRIEVAL_TOP_K`
    /// - `CHUNK_SIZE`, `CHUNK_OVERLAP`, `MAX_UPLOAD_BYTES`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let lancedb_path = lookup("LANCEDB_PATH")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("LANCEDB_PATH environment variable is required".to_string())
            })?;

        let bind_addr = match lookup("RAG_BIND_ADDR") {
            Some(raw) => raw.trim().parse::<SocketAddr>().map_err(|e| {
                AppError::Config(format!("RAG_BIND_ADDR '{raw}' is not a socket address: {e}"))
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8000)),
        };

        let transport = match lookup("RAG_TRANSPORT").as_deref().map(str::trim) {
            None | Some("http") => Transport::Http,
            Some("stdio") => Transport::Stdio,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "RAG_TRANSPORT must be 'http' or 'stdio', got '{other}'"
                )))
            }
        };

        let retrieval_top_k = positive(&lookup, "RETRIEVAL_TOP_K", 4)?;
        let chunk_size = positive(&lookup, "CHUNK_SIZE", 2000)?;
        let chunk_overlap = number(&lookup, "CHUNK_OVERLAP", 200)?;
        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "CHUNK_OVERLAP ({chunk_overlap}) must be less than CHUNK_SIZE ({chunk_size})"
            )));
        }
        let max_upload_bytes = positive(&lookup, "MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?;

        Ok(Self {
            lancedb_path,
            redis_url: lookup("REDIS_URL").filter(|u| !u.trim().is_empty()),
            bind_addr,
            transport,
            default_collection: lookup("DEFAULT_COLLECTION")
                .unwrap_or_else(|| "default_collection".to_string()),
            chat_model: lookup("CHAT_MODEL").unwrap_or_else(|| "llama3.2:latest".to_string()),
            retrieval_top_k,
            chunk_size,
            chunk_overlap,
            max_upload_bytes,
        })
    }
}

fn number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|e| AppError::Config(format!("{key} '{raw}' is not a number: {e}"))),
        None => Ok(default),
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, AppError> {
    let value = number(lookup, key, default)?;
    if value == 0 {
        return Err(AppError::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

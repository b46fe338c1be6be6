use std::path::PathBuf;

use crate::app_config::{AccuracyContext, AppConfig, Environment, ScorerChoice, VectorBackend};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let alpha_vantage_api_key = require("ALPHA_VANTAGE_API_KEY")?;
    let openai_api_key = require("OPENAI_API_KEY")?;
    let bespoke_api_key = lookup("BESPOKE_API_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let env = parse_environment(&or_default("NEWSDESK_ENV", "development"))?;
    let log_level = or_default("NEWSDESK_LOG_LEVEL", "info");

    let alpha_vantage_url = or_default(
        "NEWSDESK_ALPHA_VANTAGE_URL",
        "https://www.alphavantage.co/query",
    );
    let openai_url = or_default("NEWSDESK_OPENAI_URL", "https://api.openai.com/v1");
    let chat_model = or_default("NEWSDESK_CHAT_MODEL", "gpt-4");
    let embedding_model = or_default("NEWSDESK_EMBEDDING_MODEL", "text-embedding-ada-002");
    let embedding_dim = parse_usize("NEWSDESK_EMBEDDING_DIM", "1536")?;
    if embedding_dim == 0 {
        return Err(invalid("NEWSDESK_EMBEDDING_DIM", "must be positive".into()));
    }
    let bespoke_url = or_default("NEWSDESK_BESPOKE_URL", "https://api.bespokelabs.ai");

    let scorer = parse_scorer(&or_default("NEWSDESK_SCORER", "auto"))?;
    if scorer == ScorerChoice::FactCheck && bespoke_api_key.is_none() {
        return Err(ConfigError::MissingEnvVar("BESPOKE_API_KEY".to_string()));
    }

    let vector_backend = parse_backend(&or_default("NEWSDESK_VECTOR_BACKEND", "local"))?;
    let store_path = PathBuf::from(or_default("NEWSDESK_STORE_PATH", "./data/collections.json"));
    let qdrant_url = lookup("NEWSDESK_QDRANT_URL").ok();
    if vector_backend == VectorBackend::Qdrant && qdrant_url.is_none() {
        return Err(ConfigError::MissingEnvVar("NEWSDESK_QDRANT_URL".to_string()));
    }

    let request_timeout_secs = parse_u64("NEWSDESK_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "NEWSDESK_REQUEST_TIMEOUT_SECS",
            "must be positive".into(),
        ));
    }
    let news_limit = parse_u32("NEWSDESK_NEWS_LIMIT", "50")?;
    let news_sort = or_default("NEWSDESK_NEWS_SORT", "RELEVANCE");
    let top_k = parse_usize("NEWSDESK_TOP_K", "5")?;
    if top_k == 0 {
        return Err(invalid("NEWSDESK_TOP_K", "must be positive".into()));
    }
    let accuracy_context =
        parse_accuracy_context(&or_default("NEWSDESK_ACCURACY_CONTEXT", "retrieved"))?;
    let parallel_branches = parse_bool("NEWSDESK_PARALLEL_BRANCHES", "true")?;

    Ok(AppConfig {
        env,
        log_level,
        alpha_vantage_api_key,
        alpha_vantage_url,
        openai_api_key,
        openai_url,
        chat_model,
        embedding_model,
        embedding_dim,
        bespoke_api_key,
        bespoke_url,
        scorer,
        vector_backend,
        store_path,
        qdrant_url,
        request_timeout_secs,
        news_limit,
        news_sort,
        top_k,
        accuracy_context,
        parallel_branches,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSDESK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_scorer(s: &str) -> Result<ScorerChoice, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(ScorerChoice::Auto),
        "factcheck" | "bespoke" => Ok(ScorerChoice::FactCheck),
        "cosine" => Ok(ScorerChoice::Cosine),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSDESK_SCORER".to_string(),
            reason: format!("expected auto, factcheck or cosine, got '{other}'"),
        }),
    }
}

fn parse_backend(s: &str) -> Result<VectorBackend, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "local" => Ok(VectorBackend::Local),
        "qdrant" => Ok(VectorBackend::Qdrant),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSDESK_VECTOR_BACKEND".to_string(),
            reason: format!("expected local or qdrant, got '{other}'"),
        }),
    }
}

fn parse_accuracy_context(s: &str) -> Result<AccuracyContext, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "retrieved" => Ok(AccuracyContext::Retrieved),
        "summaries" => Ok(AccuracyContext::Summaries),
        "both" => Ok(AccuracyContext::Both),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSDESK_ACCURACY_CONTEXT".to_string(),
            reason: format!("expected retrieved, summaries or both, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

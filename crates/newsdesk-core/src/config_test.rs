use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("ALPHA_VANTAGE_API_KEY", "av-test-key");
    m.insert("OPENAI_API_KEY", "sk-test");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn production_logs_are_undecorated() {
    assert!(Environment::Development.decorated_logs());
    assert!(Environment::Test.decorated_logs());
    assert!(!Environment::Production.decorated_logs());
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "NEWSDESK_ENV"));
}

#[test]
fn build_app_config_fails_without_alpha_vantage_key() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "ALPHA_VANTAGE_API_KEY"),
        "expected MissingEnvVar(ALPHA_VANTAGE_API_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_openai_key() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("ALPHA_VANTAGE_API_KEY", "av-test-key");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "OPENAI_API_KEY"),
        "expected MissingEnvVar(OPENAI_API_KEY), got: {result:?}"
    );
}

#[test]
fn blank_required_key_counts_as_missing() {
    let mut map = full_env();
    map.insert("OPENAI_API_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "OPENAI_API_KEY"));
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.alpha_vantage_url, "https://www.alphavantage.co/query");
    assert_eq!(cfg.openai_url, "https://api.openai.com/v1");
    assert_eq!(cfg.chat_model, "gpt-4");
    assert_eq!(cfg.embedding_model, "text-embedding-ada-002");
    assert_eq!(cfg.embedding_dim, 1536);
    assert!(cfg.bespoke_api_key.is_none());
    assert_eq!(cfg.scorer, ScorerChoice::Auto);
    assert_eq!(cfg.effective_scorer(), ScorerChoice::Cosine);
    assert_eq!(cfg.vector_backend, VectorBackend::Local);
    assert_eq!(cfg.store_path, PathBuf::from("./data/collections.json"));
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.news_limit, 50);
    assert_eq!(cfg.news_sort, "RELEVANCE");
    assert_eq!(cfg.top_k, 5);
    assert_eq!(cfg.accuracy_context, AccuracyContext::Retrieved);
    assert!(cfg.parallel_branches);
}

#[test]
fn auto_scorer_uses_factcheck_when_key_present() {
    let mut map = full_env();
    map.insert("BESPOKE_API_KEY", "bk-test");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.effective_scorer(), ScorerChoice::FactCheck);
}

#[test]
fn explicit_factcheck_requires_key() {
    let mut map = full_env();
    map.insert("NEWSDESK_SCORER", "factcheck");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "BESPOKE_API_KEY"));
}

#[test]
fn explicit_cosine_wins_over_key() {
    let mut map = full_env();
    map.insert("BESPOKE_API_KEY", "bk-test");
    map.insert("NEWSDESK_SCORER", "cosine");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.effective_scorer(), ScorerChoice::Cosine);
}

#[test]
fn qdrant_backend_requires_url() {
    let mut map = full_env();
    map.insert("NEWSDESK_VECTOR_BACKEND", "qdrant");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "NEWSDESK_QDRANT_URL"),
        "expected MissingEnvVar(NEWSDESK_QDRANT_URL), got: {result:?}"
    );

    map.insert("NEWSDESK_QDRANT_URL", "http://localhost:6333");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.vector_backend, VectorBackend::Qdrant);
    assert_eq!(cfg.qdrant_url.as_deref(), Some("http://localhost:6333"));
}

#[test]
fn unknown_backend_is_invalid() {
    let mut map = full_env();
    map.insert("NEWSDESK_VECTOR_BACKEND", "chroma");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDESK_VECTOR_BACKEND"
    ));
}

#[test]
fn request_timeout_override_and_invalid() {
    let mut map = full_env();
    map.insert("NEWSDESK_REQUEST_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 5);

    map.insert("NEWSDESK_REQUEST_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDESK_REQUEST_TIMEOUT_SECS"
    ));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut map = full_env();
    map.insert("NEWSDESK_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDESK_REQUEST_TIMEOUT_SECS"
    ));
}

#[test]
fn zero_top_k_is_rejected() {
    let mut map = full_env();
    map.insert("NEWSDESK_TOP_K", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDESK_TOP_K"
    ));
}

#[test]
fn accuracy_context_variants() {
    let mut map = full_env();
    map.insert("NEWSDESK_ACCURACY_CONTEXT", "summaries");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.accuracy_context, AccuracyContext::Summaries);

    map.insert("NEWSDESK_ACCURACY_CONTEXT", "BOTH");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.accuracy_context, AccuracyContext::Both);

    map.insert("NEWSDESK_ACCURACY_CONTEXT", "everything");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn parallel_branches_parses_booleans() {
    let mut map = full_env();
    map.insert("NEWSDESK_PARALLEL_BRANCHES", "false");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.parallel_branches);

    map.insert("NEWSDESK_PARALLEL_BRANCHES", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "NEWSDESK_PARALLEL_BRANCHES"
    ));
}

#[test]
fn debug_output_redacts_keys() {
    let mut map = full_env();
    map.insert("BESPOKE_API_KEY", "bk-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("av-test-key"));
    assert!(!rendered.contains("sk-test"));
    assert!(!rendered.contains("bk-secret"));
    assert!(rendered.contains("[redacted]"));
}

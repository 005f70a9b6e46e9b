use std::path::PathBuf;
use std::time::Duration;

use masstock_client::{ApiClient, ApiClientConfig};
use secrecy::SecretString;
use serde_json::{Map, Value as JsonValue};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::{ApiArgs, CatalogArgs, InputArgs, StoreArgs};

const DEFAULT_API_URL: &str = "http://localhost:8080";

pub fn redact_url_password(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("***")).is_err() {
                return url.to_string();
            }
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn database_url(store: &StoreArgs) -> Result<String, String> {
    store
        .database_url
        .clone()
        .or_else(|| env_nonempty("MASSTOCK_DATABASE_URL"))
        .or_else(|| env_nonempty("DATABASE_URL"))
        .ok_or_else(|| {
            "missing database url (use --database-url or set MASSTOCK_DATABASE_URL / DATABASE_URL)"
                .to_string()
        })
}

pub fn catalog_path(catalog: &CatalogArgs) -> Result<PathBuf, String> {
    catalog
        .catalog
        .clone()
        .or_else(|| env_nonempty("MASSTOCK_CATALOG").map(PathBuf::from))
        .ok_or_else(|| "missing workflow catalog (use --catalog or set MASSTOCK_CATALOG)".to_string())
}

pub fn api_client(api: &ApiArgs) -> Result<ApiClient, String> {
    let raw_url = api
        .api_url
        .clone()
        .or_else(|| env_nonempty("MASSTOCK_API_URL"))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let base_url = Url::parse(&raw_url).map_err(|e| format!("invalid api url {raw_url}: {e}"))?;

    let client_id = api
        .client_id
        .clone()
        .or_else(|| env_nonempty("MASSTOCK_CLIENT_ID"))
        .ok_or_else(|| "missing client id (use --client-id or set MASSTOCK_CLIENT_ID)".to_string())?;

    let mut config = ApiClientConfig::new(base_url, client_id);
    config.token = api
        .token
        .clone()
        .or_else(|| env_nonempty("MASSTOCK_API_TOKEN"))
        .map(SecretString::from);
    config.request_timeout = Duration::from_secs(api.request_timeout_secs.max(1));

    ApiClient::new(config).map_err(|e| format!("failed to build http client: {e}"))
}

pub fn parse_execution_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|e| format!("invalid execution id: {e}"))
}

/// Merges `--input` / `--input-file` with `--set KEY=VALUE` pairs.
pub fn collect_input(input: &InputArgs) -> Result<JsonValue, String> {
    let base = match (&input.input, &input.input_file) {
        (Some(raw), _) => {
            serde_json::from_str(raw).map_err(|e| format!("--input is not valid JSON: {e}"))?
        }
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            serde_json::from_str(&raw)
                .map_err(|e| format!("{} is not valid JSON: {e}", path.display()))?
        }
        (None, None) => JsonValue::Object(Map::new()),
    };

    if input.set_inputs.is_empty() {
        return Ok(base);
    }
    let JsonValue::Object(mut map) = base else {
        return Err("--set requires the input data to be a JSON object".to_string());
    };
    for pair in &input.set_inputs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid --set {pair:?}, expected KEY=VALUE"))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| JsonValue::String(value.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(JsonValue::Object(map))
}

/// Token cancelled on SIGINT or SIGTERM.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received");
        trigger.cancel();
    });
    token
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_password_only() {
        assert_eq!(
            redact_url_password("postgres://app:s3cret@db:5432/masstock"),
            "postgres://app:***@db:5432/masstock"
        );
        assert_eq!(
            redact_url_password("postgres://db:5432/masstock"),
            "postgres://db:5432/masstock"
        );
    }

    #[test]
    fn set_pairs_override_input() {
        let args = InputArgs {
            input: Some(r#"{"prompt": "a", "count": 1}"#.to_string()),
            input_file: None,
            set_inputs: vec!["count=3".to_string(), "style=noir".to_string()],
        };
        let merged = collect_input(&args).unwrap();
        assert_eq!(
            merged,
            serde_json::json!({"prompt": "a", "count": 3, "style": "noir"})
        );
    }

    #[test]
    fn set_requires_object_input() {
        let args = InputArgs {
            input: Some("[1, 2]".to_string()),
            input_file: None,
            set_inputs: vec!["a=b".to_string()],
        };
        assert!(collect_input(&args).is_err());
    }
}

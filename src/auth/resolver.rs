//! Tiered authorization resolution.
//!
//! Order of precedence: master key (Admin), then system keys (System), then
//! the keys scoped to the target function (Function). The first matching
//! tier wins; no match resolves Anonymous.

use actix_web::http::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use crate::auth::matcher::{self, MatchEvaluator};
use crate::auth::{AuthorizationLevel, AuthorizationResult, MasterKey};
use crate::config::{CODE_QUERY_PARAM, FUNCTIONS_KEY_HEADER};
use crate::error::AppResult;
use crate::secrets::SecretStore;

/// Extract the presented key from request metadata.
///
/// The `x-functions-key` header is checked first; the `code` query
/// parameter is the fallback. First non-empty value wins. The value is
/// wrapped in `SecretString` immediately so it never reaches logs.
pub fn presented_key(headers: &HeaderMap, query_string: &str) -> Option<SecretString> {
    let from_header = headers
        .get(FUNCTIONS_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    if let Some(value) = from_header {
        return Some(SecretString::from(value.to_string()));
    }

    query_string
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == CODE_QUERY_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.into_owned()))
}

/// Resolve the caller's authorization level.
///
/// `evaluator` overrides the match rule applied to the system and function
/// key collections; `None` uses the default any-key rule. Store failures
/// propagate as errors - the gate treats them as a deny, never as an allow.
pub async fn resolve(
    store: &dyn SecretStore,
    presented: Option<&SecretString>,
    function_name: Option<&str>,
    evaluator: Option<&MatchEvaluator>,
) -> AppResult<AuthorizationResult> {
    // No key presented: Anonymous, and the store is never consulted.
    let presented = match presented {
        Some(key) if !key.expose_secret().is_empty() => key.expose_secret(),
        _ => return Ok(AuthorizationResult::anonymous()),
    };

    let default_evaluator = matcher::default_evaluator();
    let evaluator = &**evaluator.unwrap_or(&default_evaluator);

    let host_secrets = store.get_host_secrets().await?;

    if MasterKey::new(host_secrets.master_key).verify(presented) {
        tracing::debug!("request authorized with master key");
        return Ok(AuthorizationResult::admin());
    }

    if let Some(name) = evaluator(&host_secrets.system_keys, presented) {
        tracing::debug!(key = %name, "request authorized with system key");
        return Ok(AuthorizationResult::new(AuthorizationLevel::System, name));
    }

    if let Some(function_name) = function_name {
        let function_secrets = store.get_function_secrets(function_name).await?;
        if let Some(name) = evaluator(&function_secrets, presented) {
            tracing::debug!(key = %name, function = %function_name, "request authorized with function key");
            return Ok(AuthorizationResult::new(AuthorizationLevel::Function, name));
        }
    }

    Ok(AuthorizationResult::anonymous())
}

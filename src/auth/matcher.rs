//! Constant-time key matching.

use std::sync::Arc;

use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::secrets::SecretMap;

/// Pluggable match rule applied to a secret collection.
///
/// The default rule matches any key in the collection; a narrower rule
/// (e.g. [`named_key_evaluator`]) may replace it per gate.
pub type MatchEvaluator = Arc<dyn Fn(&SecretMap, &str) -> Option<String> + Send + Sync>;

/// Compare two secret values.
///
/// Uses `subtle::ConstantTimeEq` which performs a constant-time byte-by-byte
/// comparison. Unlike a naive `==`, it never returns early on the first
/// mismatching byte, so response timing cannot leak how long a matching
/// prefix the caller guessed.
pub fn secret_value_equals(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Find the name of the key whose value matches the presented value.
///
/// With `restrict_to` set, only the key of that name (compared
/// case-insensitively) is considered. Callers must not pass an empty
/// presented value; the resolver short-circuits that case upstream.
///
/// Duplicate values are a policy choice, not a defect: the first match in
/// the collection's name order wins.
pub fn find_key_match(
    secrets: &SecretMap,
    presented: &str,
    restrict_to: Option<&str>,
) -> Option<String> {
    secrets
        .iter()
        .find(|(name, value)| {
            restrict_to.is_none_or(|restricted| name.eq_ignore_ascii_case(restricted))
                && secret_value_equals(value.expose_secret(), presented)
        })
        .map(|(name, _)| name.clone())
}

/// The default match rule: any key in the collection may match.
pub fn default_evaluator() -> MatchEvaluator {
    Arc::new(|secrets, presented| find_key_match(secrets, presented, None))
}

/// Match rule restricted to a single named key.
///
/// A presented value equal to a *different* key's value yields no match,
/// even though the unrestricted rule would accept it.
pub fn named_key_evaluator(key_name: &str) -> MatchEvaluator {
    let key_name = key_name.to_string();
    Arc::new(move |secrets, presented| find_key_match(secrets, presented, Some(&key_name)))
}

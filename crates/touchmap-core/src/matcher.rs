//! Identity matcher: finds the configuration-store key for a digitizer.
//!
//! The store never uses a digitizer's device id verbatim as a key.  Windows
//! prefixes it (e.g. `20-\\?\HID#VID_0EEF&...`), so the only reliable link is
//! substring containment.  Containment is ordinal and case-sensitive.
//!
//! Two ids can contain one another, and one id can show up in several keys.
//! [`MatchPolicy::Strict`] turns that into an explicit
//! [`MatchError::Ambiguous`]; [`MatchPolicy::FirstMatch`] picks the first key
//! in store enumeration order instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// How to treat a digitizer id that is contained in more than one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Several matching keys is an error.
    #[default]
    Strict,
    /// The first matching key in enumeration order wins.
    FirstMatch,
}

/// Error type for identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No store key contains the digitizer id.
    #[error("touchscreen {digitizer_id:?} does not exist in the configuration store")]
    DigitizerNotRegistered { digitizer_id: String },

    /// More than one store key contains the digitizer id.
    #[error(
        "touchscreen {digitizer_id:?} matches {count} configuration store keys",
        count = .candidates.len()
    )]
    Ambiguous {
        digitizer_id: String,
        candidates: Vec<String>,
    },
}

/// Returns the store key that embeds `digitizer_id`.
///
/// `keys` must be in store enumeration order; that order decides the winner
/// under [`MatchPolicy::FirstMatch`].
///
/// # Errors
///
/// - [`MatchError::DigitizerNotRegistered`] if no key matches, or if
///   `digitizer_id` is empty (an empty id is contained in every key).
/// - [`MatchError::Ambiguous`] if several keys match under
///   [`MatchPolicy::Strict`].
pub fn resolve_store_key<S: AsRef<str>>(
    keys: &[S],
    digitizer_id: &str,
    policy: MatchPolicy,
) -> Result<String, MatchError> {
    if digitizer_id.is_empty() {
        return Err(MatchError::DigitizerNotRegistered {
            digitizer_id: String::new(),
        });
    }

    let mut candidates = keys
        .iter()
        .map(AsRef::as_ref)
        .filter(|key| key.contains(digitizer_id));

    let first = candidates
        .next()
        .ok_or_else(|| MatchError::DigitizerNotRegistered {
            digitizer_id: digitizer_id.to_string(),
        })?;

    if policy == MatchPolicy::Strict {
        let rest: Vec<&str> = candidates.collect();
        if !rest.is_empty() {
            let mut all = Vec::with_capacity(rest.len() + 1);
            all.push(first.to_string());
            all.extend(rest.into_iter().map(str::to_string));
            return Err(MatchError::Ambiguous {
                digitizer_id: digitizer_id.to_string(),
                candidates: all,
            });
        }
    }

    debug!(digitizer_id, store_key = first, "resolved store key");
    Ok(first.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 3] = [
        "20-Digitizer_ABC123",
        "20-Digitizer_DEF456",
        "10-Pen_ZZZ",
    ];

    #[test]
    fn test_resolve_returns_key_containing_digitizer_id() {
        // Act
        let key = resolve_store_key(&KEYS, "ABC123", MatchPolicy::Strict).expect("resolve");

        // Assert
        assert_eq!(key, "20-Digitizer_ABC123");
    }

    #[test]
    fn test_resolve_unknown_id_is_not_registered() {
        let err = resolve_store_key(&KEYS, "XYZ999", MatchPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            MatchError::DigitizerNotRegistered {
                digitizer_id: "XYZ999".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let err = resolve_store_key(&KEYS, "abc123", MatchPolicy::Strict).unwrap_err();
        assert!(matches!(err, MatchError::DigitizerNotRegistered { .. }));
    }

    #[test]
    fn test_resolve_empty_id_never_matches() {
        let err = resolve_store_key(&KEYS, "", MatchPolicy::FirstMatch).unwrap_err();
        assert!(matches!(err, MatchError::DigitizerNotRegistered { .. }));
    }

    #[test]
    fn test_resolve_against_empty_store_is_not_registered() {
        let keys: [&str; 0] = [];
        let err = resolve_store_key(&keys, "ABC123", MatchPolicy::Strict).unwrap_err();
        assert!(matches!(err, MatchError::DigitizerNotRegistered { .. }));
    }

    #[test]
    fn test_strict_policy_reports_all_candidates_when_ambiguous() {
        // Arrange: "Digitizer_" is contained in two keys
        let err = resolve_store_key(&KEYS, "Digitizer_", MatchPolicy::Strict).unwrap_err();

        // Assert
        match err {
            MatchError::Ambiguous {
                digitizer_id,
                candidates,
            } => {
                assert_eq!(digitizer_id, "Digitizer_");
                assert_eq!(
                    candidates,
                    vec!["20-Digitizer_ABC123".to_string(), "20-Digitizer_DEF456".to_string()]
                );
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_first_match_policy_picks_first_key_in_enumeration_order() {
        let key = resolve_store_key(&KEYS, "Digitizer_", MatchPolicy::FirstMatch).expect("resolve");
        assert_eq!(key, "20-Digitizer_ABC123");
    }

    #[test]
    fn test_resolve_accepts_owned_strings() {
        let keys: Vec<String> = KEYS.iter().map(|k| k.to_string()).collect();
        let key = resolve_store_key(&keys, "ZZZ", MatchPolicy::Strict).expect("resolve");
        assert_eq!(key, "10-Pen_ZZZ");
    }

    #[test]
    fn test_ambiguous_error_message_reports_candidate_count() {
        let err = resolve_store_key(&KEYS, "Digitizer_", MatchPolicy::Strict).unwrap_err();
        assert!(err.to_string().contains("matches 2 configuration store keys"));
    }

    #[test]
    fn test_match_policy_deserializes_from_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: MatchPolicy,
        }
        let w: Wrapper = serde_json::from_str(r#"{"policy":"first-match"}"#).expect("deserialize");
        assert_eq!(w.policy, MatchPolicy::FirstMatch);
    }
}

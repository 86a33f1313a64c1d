//! The verified caller identity for one request.

use std::convert::Infallible;

use axum::extract::OptionalFromRequestParts;
use axum::http::request::Parts;
use serde_json::Value;

use super::strategy::StrategyName;
use super::token::Claims;

/// Identity derived from a valid token.
///
/// Inserted into request extensions by the guard middleware; handlers
/// extract it as `Option<Principal>`, which is `None` on open operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable subject identifier (`sub`, falling back to `name`).
    pub subject: String,
    /// Display name (`name`, falling back to the subject).
    pub name: String,
    /// Strategy that admitted the request.
    pub strategy: StrategyName,
    /// All custom claims carried by the token.
    pub claims: Claims,
}

impl Principal {
    /// Build a principal from decoded claims.
    ///
    /// Returns `None` if the claims carry neither a `sub` nor a `name`.
    #[must_use]
    pub fn from_claims(strategy: StrategyName, claims: Claims) -> Option<Self> {
        let sub = non_empty_string(claims.get("sub"));
        let name = non_empty_string(claims.get("name"));

        let subject = sub.or_else(|| name.clone())?;
        let name = name.unwrap_or_else(|| subject.clone());

        Some(Self {
            subject,
            name,
            strategy,
            claims,
        })
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Principal {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde_json::json;

    use super::*;

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => map,
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn test_subject_and_name_from_claims() {
        let principal = Principal::from_claims(
            StrategyName::Admin,
            claims(json!({"sub": "p-1", "name": "Alice"})),
        )
        .expect("identity present");

        assert_eq!(principal.subject, "p-1");
        assert_eq!(principal.name, "Alice");
        assert_eq!(principal.strategy, StrategyName::Admin);
    }

    #[test]
    fn test_name_only_claims() {
        let principal =
            Principal::from_claims(StrategyName::Admin, claims(json!({"name": "alice"})))
                .expect("identity present");

        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.name, "alice");
    }

    #[test]
    fn test_subject_only_claims() {
        let principal =
            Principal::from_claims(StrategyName::Admin, claims(json!({"sub": "alice"})))
                .expect("identity present");

        assert_eq!(principal.name, "alice");
    }

    #[tokio::test]
    async fn test_extractor_reads_request_extensions() {
        let principal =
            Principal::from_claims(StrategyName::Admin, claims(json!({"sub": "p-1"})))
                .expect("identity present");
        let (mut parts, ()) = Request::new(()).into_parts();

        let absent =
            <Principal as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert_eq!(absent, Ok(None));

        parts.extensions.insert(principal.clone());
        let present =
            <Principal as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert_eq!(present, Ok(Some(principal)));
    }

    #[test]
    fn test_claims_without_identity() {
        for value in [json!({"role": "x"}), json!({"sub": ""}), json!({"sub": 7})] {
            assert!(Principal::from_claims(StrategyName::Admin, claims(value)).is_none());
        }
    }
}

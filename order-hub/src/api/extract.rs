//! Request metadata extractor
//!
//! Reads the command headers every mutating route accepts:
//!
//! | Header | Meaning | Default |
//! |--------|---------|---------|
//! | `Idempotency-Key` | Retry-safe key, unique per order | none |
//! | `X-Event-Source` | `staff` / `guest` / `voice` | `staff` |

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::order::EventSource;

use crate::orders::CommandMetadata;
use crate::utils::AppError;

const IDEMPOTENCY_KEY: &str = "idempotency-key";
const EVENT_SOURCE: &str = "x-event-source";

/// Longest accepted idempotency key
const MAX_KEY_LEN: usize = 128;

/// Command metadata taken from request headers
#[derive(Debug, Clone)]
pub struct RequestMeta(pub CommandMetadata);

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| -> Result<Option<String>, AppError> {
            match parts.headers.get(name) {
                None => Ok(None),
                Some(value) => value
                    .to_str()
                    .map(|s| Some(s.trim().to_string()))
                    .map_err(|_| AppError::validation(format!("{name} header is not valid text"))),
            }
        };

        let idempotency_key = header(IDEMPOTENCY_KEY)?.filter(|key| !key.is_empty());
        if idempotency_key
            .as_ref()
            .is_some_and(|key| key.len() > MAX_KEY_LEN)
        {
            return Err(AppError::validation(format!(
                "Idempotency-Key must be at most {MAX_KEY_LEN} characters"
            )));
        }

        let source = match header(EVENT_SOURCE)? {
            Some(raw) => raw.to_ascii_lowercase().parse().map_err(AppError::validation)?,
            None => EventSource::Staff,
        };

        Ok(Self(CommandMetadata::new(source, idempotency_key)))
    }
}

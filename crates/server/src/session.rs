//! Viewer session id carried in the `x-session-id` header.

use std::convert::Infallible;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use axum::{extract::FromRequestParts, http::request::Parts};

pub const SESSION_HEADER: &str = "x-session-id";

/// The caller's session id, or a freshly minted one when the header is missing
/// or malformed.
#[derive(Debug, Clone)]
pub struct ViewSessionId {
    id: String,
    minted: bool,
}

impl ViewSessionId {
    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.minted
    }

    fn mint() -> Self {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        let id = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self { id, minted: true }
    }
}

fn is_valid(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl<S> FromRequestParts<S> for ViewSessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| is_valid(id));

        Ok(match supplied {
            Some(id) => Self {
                id: id.to_string(),
                minted: false,
            },
            None => Self::mint(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_ids_are_hex_and_distinct() {
        let a = ViewSessionId::mint();
        let b = ViewSessionId::mint();
        assert_eq!(a.as_str().len(), 32);
        assert!(is_valid(a.as_str()));
        assert!(a.is_new());
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_header_validation() {
        assert!(is_valid("abc-123_X"));
        assert!(!is_valid(""));
        assert!(!is_valid("has space"));
        assert!(!is_valid(&"a".repeat(129)));
    }
}

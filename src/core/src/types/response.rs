//! Answers returned by authority connectors

use serde::{Deserialize, Serialize};

/// Outcome an authority reports for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Authorized,
    Unreachable,
    UserUnauthorized,
    UserNotFound,
}

/// An authority's answer: a status plus the tokens it grants, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub status: ResponseStatus,

    /// `None` when the authority returned no token list at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_tokens: Option<Vec<String>>,
}

impl AuthorizationResponse {
    pub fn new(status: ResponseStatus, access_tokens: Option<Vec<String>>) -> Self {
        Self {
            status,
            access_tokens,
        }
    }

    pub fn authorized<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            ResponseStatus::Authorized,
            Some(tokens.into_iter().map(Into::into).collect()),
        )
    }

    pub fn unreachable() -> Self {
        Self::new(ResponseStatus::Unreachable, None)
    }

    pub fn unauthorized() -> Self {
        Self::new(ResponseStatus::UserUnauthorized, None)
    }

    pub fn user_not_found() -> Self {
        Self::new(ResponseStatus::UserNotFound, None)
    }

    /// Attach tokens to any status (e.g. deny tokens on an unreachable answer)
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    pub fn tokens(&self) -> &[String] {
        self.access_tokens.as_deref().unwrap_or(&[])
    }
}

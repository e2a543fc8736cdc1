//! Authority answering from its own configuration

use aclgate_core::{
    AuthorityConnector, AuthorizationResponse, ConfigParams, ConnectorError, ResponseStatus,
    UserRecord,
};
use async_trait::async_trait;

pub const CLASS_NAME: &str = "aclgate.authority.static";

/// Grants a fixed token list
///
/// Configuration:
/// - `tokens`: tokens granted to known users
/// - `users` (optional): leaf user names this authority knows; anyone else
///   is reported as not found. Without it every user is known.
/// - `status` (optional): `authorized` (default), `unreachable`,
///   `unauthorized` or `user_not_found`
#[derive(Debug, Clone)]
pub struct StaticAuthority {
    status: ResponseStatus,
    tokens: Vec<String>,
    users: Option<Vec<String>>,
}

impl StaticAuthority {
    pub fn from_config(config: &ConfigParams) -> Result<Self, ConnectorError> {
        let status = match config.get_str("status").unwrap_or("authorized") {
            "authorized" => ResponseStatus::Authorized,
            "unreachable" => ResponseStatus::Unreachable,
            "unauthorized" => ResponseStatus::UserUnauthorized,
            "user_not_found" => ResponseStatus::UserNotFound,
            other => {
                return Err(ConnectorError::domain(format!(
                    "unknown status '{}' in static authority configuration",
                    other
                )))
            }
        };

        Ok(Self {
            status,
            tokens: config.get_str_list("tokens").unwrap_or_default(),
            users: config.get_str_list("users"),
        })
    }
}

#[async_trait]
impl AuthorityConnector for StaticAuthority {
    async fn authorize(&self, user: &UserRecord) -> Result<AuthorizationResponse, ConnectorError> {
        if let Some(users) = &self.users {
            if !users.iter().any(|u| u == user.user()) {
                return Ok(AuthorizationResponse::user_not_found());
            }
        }

        Ok(AuthorizationResponse::new(self.status, Some(self.tokens.clone())))
    }
}

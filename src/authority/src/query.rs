//! ACL request parameters

use aclgate_core::UserRecord;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("missing required parameter 'username'")]
    MissingUsername,
}

/// One "what can this user see?" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclQuery {
    /// User identifier exactly as the caller sent it
    pub user_id: String,

    /// Domain qualifiers, outermost first
    pub domains: Vec<String>,

    /// Append an `ID:` line echoing `user_id`
    pub id_needed: bool,

    /// Include `TOKEN:` lines
    pub acl_needed: bool,
}

impl AclQuery {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            domains: Vec::new(),
            id_needed: false,
            acl_needed: true,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.push(domain.into());
        self
    }

    pub fn with_id_needed(mut self, id_needed: bool) -> Self {
        self.id_needed = id_needed;
        self
    }

    pub fn with_acl_needed(mut self, acl_needed: bool) -> Self {
        self.acl_needed = acl_needed;
        self
    }

    /// Parse decoded query parameters
    ///
    /// `username` is required (first occurrence wins); every `domain` is
    /// kept in order. `idneeded` and `aclneeded` accept `true`/`false`;
    /// anything else leaves the default.
    pub fn from_params<K, V>(params: &[(K, V)]) -> Result<Self, QueryError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let first = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k.as_ref() == key)
                .map(|(_, v)| v.as_ref())
        };

        let mut query = Self::new(first("username").ok_or(QueryError::MissingUsername)?);
        query.domains = params
            .iter()
            .filter(|(k, _)| k.as_ref() == "domain")
            .map(|(_, v)| v.as_ref().to_string())
            .collect();
        if let Some(flag) = first("idneeded").and_then(parse_flag) {
            query.id_needed = flag;
        }
        if let Some(flag) = first("aclneeded").and_then(parse_flag) {
            query.acl_needed = flag;
        }
        Ok(query)
    }

    /// Identity record this request resolves
    pub fn user_record(&self) -> UserRecord {
        UserRecord::from_request(&self.user_id, &self.domains)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

//! Qualified user identities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain assumed when a request carries no domain qualifiers
pub const DEFAULT_DOMAIN: &str = "";

/// A domain-qualified user identity
///
/// Conceptually a record is a domain label plus a local value, where the
/// local value is either the user name or another, inner record. It is
/// stored flat: the qualifying domains outermost first, then the leaf user
/// name. A record always carries at least one domain.
///
/// Records are immutable; mapping connectors build new ones with
/// [`UserRecord::with_user`] and friends instead of editing in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRecord {
    domains: Vec<String>,
    user: String,
}

/// The local value of the outermost level of a [`UserRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalValue<'a> {
    /// The leaf user name
    User(&'a str),
    /// A nested record qualified by the outer domain
    Nested(UserRecord),
}

impl UserRecord {
    /// Create a single-qualified identity
    pub fn new(domain: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            domains: vec![domain.into()],
            user: user.into(),
        }
    }

    /// Create an identity from its qualifiers, outermost first
    ///
    /// An empty qualifier list yields a record in [`DEFAULT_DOMAIN`].
    pub fn from_qualifiers<I, S>(domains: I, user: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut domains: Vec<String> = domains.into_iter().map(Into::into).collect();
        if domains.is_empty() {
            domains.push(DEFAULT_DOMAIN.to_string());
        }
        Self {
            domains,
            user: user.into(),
        }
    }

    /// Build the identity for an incoming ACL request
    ///
    /// With explicit `domains`, the first one is the outermost qualifier and
    /// the last one directly qualifies `user_id`. Without any, a `name@domain`
    /// identifier is split at its first `@`; a plain identifier lands in the
    /// default domain.
    pub fn from_request(user_id: &str, domains: &[String]) -> Self {
        if !domains.is_empty() {
            return Self::from_qualifiers(domains.iter().cloned(), user_id);
        }

        match user_id.split_once('@') {
            Some((user, domain)) => Self::new(domain, user),
            None => Self::new(DEFAULT_DOMAIN, user_id),
        }
    }

    /// The outermost domain label
    pub fn domain(&self) -> &str {
        &self.domains[0]
    }

    /// The outermost local value
    pub fn local(&self) -> LocalValue<'_> {
        match self.inner() {
            Some(inner) => LocalValue::Nested(inner),
            None => LocalValue::User(&self.user),
        }
    }

    /// The record nested inside the outermost domain, if any
    pub fn inner(&self) -> Option<UserRecord> {
        if self.domains.len() < 2 {
            return None;
        }
        Some(Self {
            domains: self.domains[1..].to_vec(),
            user: self.user.clone(),
        })
    }

    /// All qualifying domains, outermost first
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// The domain that directly qualifies the user name
    pub fn innermost_domain(&self) -> &str {
        self.domains.last().map(String::as_str).unwrap_or(DEFAULT_DOMAIN)
    }

    /// The leaf user name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Nesting depth (number of domain qualifiers)
    pub fn depth(&self) -> usize {
        self.domains.len()
    }

    /// Same qualifiers, different leaf user name
    pub fn with_user(&self, user: impl Into<String>) -> Self {
        Self {
            domains: self.domains.clone(),
            user: user.into(),
        }
    }

    /// Same leaf user, innermost domain replaced
    pub fn with_innermost_domain(&self, domain: impl Into<String>) -> Self {
        let mut domains = self.domains.clone();
        if let Some(last) = domains.last_mut() {
            *last = domain.into();
        }
        Self {
            domains,
            user: self.user.clone(),
        }
    }

    /// Wrap this record in one more, outer domain
    pub fn qualified_by(&self, domain: impl Into<String>) -> Self {
        let mut domains = Vec::with_capacity(self.domains.len() + 1);
        domains.push(domain.into());
        domains.extend(self.domains.iter().cloned());
        Self {
            domains,
            user: self.user.clone(),
        }
    }
}

impl fmt::Display for UserRecord {
    /// Stable string form: `{outer:{inner:user}}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for domain in &self.domains {
            write!(f, "{{{}:", domain)?;
        }
        write!(f, "{}", self.user)?;
        for _ in &self.domains {
            write!(f, "}}")?;
        }
        Ok(())
    }
}

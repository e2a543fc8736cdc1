//! Regular-expression identity mapping

use aclgate_core::{ConfigParams, ConnectorError, MappingConnector, UserRecord};
use async_trait::async_trait;
use regex::Regex;

pub const CLASS_NAME: &str = "aclgate.mapping.regex";

/// Rewrites the leaf user name with a regular expression
///
/// Configuration:
/// - `match`: pattern applied to the leaf user name (default `^(.*)$`)
/// - `replace`: replacement, `$1`-style group references allowed
///   (default `$1`)
/// - `lowercase` (optional): lowercase the result
/// - `domain` (optional): replace the innermost domain as well
///
/// A user name the pattern does not match passes through unchanged.
#[derive(Debug, Clone)]
pub struct RegexMapper {
    pattern: Regex,
    replacement: String,
    lowercase: bool,
    domain: Option<String>,
}

impl RegexMapper {
    pub fn from_config(config: &ConfigParams) -> Result<Self, ConnectorError> {
        let source = config.get_str("match").unwrap_or("^(.*)$");
        let pattern = Regex::new(source).map_err(|e| {
            ConnectorError::domain(format!("invalid mapping pattern '{}': {}", source, e))
        })?;

        Ok(Self {
            pattern,
            replacement: config.get_str("replace").unwrap_or("$1").to_string(),
            lowercase: config.get_bool("lowercase").unwrap_or(false),
            domain: config.get_str("domain").map(str::to_string),
        })
    }
}

#[async_trait]
impl MappingConnector for RegexMapper {
    async fn map_user(&self, user: &UserRecord) -> Result<UserRecord, ConnectorError> {
        let mut mapped = match self.pattern.captures(user.user()) {
            Some(captures) => {
                let mut out = String::new();
                captures.expand(&self.replacement, &mut out);
                out
            }
            None => user.user().to_string(),
        };
        if self.lowercase {
            mapped = mapped.to_lowercase();
        }

        let record = user.with_user(mapped);
        Ok(match &self.domain {
            Some(domain) => record.with_innermost_domain(domain.clone()),
            None => record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rewrite_with_groups() {
        let config = ConfigParams::new()
            .with("match", r"^(\w+)\.(\w+)$")
            .with("replace", "${2}_$1")
            .with("lowercase", true)
            .with("domain", "ad");
        let mapper = RegexMapper::from_config(&config).unwrap();

        let mapped = mapper
            .map_user(&UserRecord::from_qualifiers(["forest", "corp"], "Alice.Smith"))
            .await
            .unwrap();
        assert_eq!(mapped.user(), "smith_alice");
        assert_eq!(mapped.domains(), &["forest".to_string(), "ad".to_string()]);
    }

    #[tokio::test]
    async fn test_unmatched_passes_through() {
        let config = ConfigParams::new().with("match", "^admin$").with("replace", "root");
        let mapper = RegexMapper::from_config(&config).unwrap();

        let user = UserRecord::new("corp", "bob");
        assert_eq!(mapper.map_user(&user).await.unwrap(), user);
    }

    #[test]
    fn test_invalid_pattern_is_domain_failure() {
        let config = ConfigParams::new().with("match", "(unclosed");
        assert!(RegexMapper::from_config(&config).unwrap_err().is_domain());
    }
}

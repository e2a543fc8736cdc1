//! Response merge buffer and its wire format
//!
//! Every field is percent-encoded as UTF-8, so a serialized buffer is pure
//! ASCII and therefore also valid ISO-8859-1.

use aclgate_core::ResponseStatus;
use std::borrow::Cow;

pub const AUTHORIZED_VALUE: &str = "AUTHORIZED:";
pub const UNREACHABLE_VALUE: &str = "UNREACHABLEAUTHORITY:";
pub const UNAUTHORIZED_VALUE: &str = "UNAUTHORIZED:";
pub const USERNOTFOUND_VALUE: &str = "USERNOTFOUND:";
pub const TOKEN_PREFIX: &str = "TOKEN:";
pub const ID_PREFIX: &str = "ID:";

/// Content type of a serialized buffer
pub const CONTENT_TYPE: &str = "text/plain; charset=ISO-8859-1";

pub fn status_prefix(status: ResponseStatus) -> &'static str {
    match status {
        ResponseStatus::Authorized => AUTHORIZED_VALUE,
        ResponseStatus::Unreachable => UNREACHABLE_VALUE,
        ResponseStatus::UserUnauthorized => UNAUTHORIZED_VALUE,
        ResponseStatus::UserNotFound => USERNOTFOUND_VALUE,
    }
}

/// Percent-encode one field
pub fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// One line of the merged answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeLine {
    Status {
        status: ResponseStatus,
        backend: String,
    },
    Token {
        backend: String,
        token: String,
    },
    Identity(String),
}

impl MergeLine {
    fn write_to(&self, out: &mut String) {
        match self {
            MergeLine::Status { status, backend } => {
                out.push_str(status_prefix(*status));
                out.push_str(&encode(backend));
            }
            MergeLine::Token { backend, token } => {
                out.push_str(TOKEN_PREFIX);
                out.push_str(&encode(backend));
                out.push(':');
                out.push_str(&encode(token));
            }
            MergeLine::Identity(user_id) => {
                out.push_str(ID_PREFIX);
                out.push_str(&encode(user_id));
            }
        }
        out.push('\n');
    }
}

/// Lines of one request's answer, in the order they were appended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeBuffer {
    lines: Vec<MergeLine>,
}

impl MergeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&mut self, status: ResponseStatus, backend: &str) {
        self.lines.push(MergeLine::Status {
            status,
            backend: backend.to_string(),
        });
    }

    pub fn push_token(&mut self, backend: &str, token: &str) {
        self.lines.push(MergeLine::Token {
            backend: backend.to_string(),
            token: token.to_string(),
        });
    }

    pub fn push_identity(&mut self, user_id: &str) {
        self.lines.push(MergeLine::Identity(user_id.to_string()));
    }

    pub fn lines(&self) -> &[MergeLine] {
        &self.lines
    }

    pub fn status_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, MergeLine::Status { .. }))
            .count()
    }

    /// Newline-terminated text form
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            line.write_to(&mut out);
        }
        out
    }

    /// Response body bytes in ISO-8859-1
    pub fn into_body(self) -> Vec<u8> {
        self.to_text()
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect()
    }
}

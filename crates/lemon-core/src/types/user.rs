//! User identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An identifier issued by the server.
///
/// Servers disagree on whether ids are numbers or strings; both are accepted
/// and serialized back in the form they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// Numeric id.
    Number(u64),
    /// Textual id.
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Identifier {
    fn from(n: u64) -> Self {
        Identifier::Number(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

/// The signed-in user's profile, persisted alongside the tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Identifier,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_and_string_ids() {
        let a: User =
            serde_json::from_str(r#"{"id":1,"email":"a@b.co","name":"A"}"#).unwrap();
        assert_eq!(a.id, Identifier::Number(1));
        assert!(a.role.is_none());

        let b: User = serde_json::from_str(
            r#"{"id":"u-9","email":"a@b.co","name":"A","role":"customer","avatar":null}"#,
        )
        .unwrap();
        assert_eq!(b.id, Identifier::Text("u-9".to_string()));
        assert_eq!(b.role.as_deref(), Some("customer"));
    }

    #[test]
    fn missing_name_is_rejected() {
        assert!(serde_json::from_str::<User>(r#"{"id":1,"email":"a@b.co"}"#).is_err());
    }
}

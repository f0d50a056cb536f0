//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated API base URL.
///
/// Base URLs must use HTTPS, or HTTP for localhost. Relative request
/// targets are joined onto this base; absolute `http://`/`https://` targets
/// bypass it.
///
/// # Example
///
/// ```
/// use lemon_core::BaseUrl;
///
/// let base = BaseUrl::new("https://api.littlelemon.example/api/").unwrap();
/// assert_eq!(base.resolve("/menu/items"), "https://api.littlelemon.example/api/menu/items");
/// assert_eq!(base.resolve("https://cdn.example/a.png"), "https://cdn.example/a.png");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Resolve a request target against this base.
    ///
    /// Absolute `http://` and `https://` targets are returned unchanged.
    /// Anything else is appended to the base with exactly one `/` between.
    pub fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }

        let base = self.as_str();
        let path = target.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Returns the base URL as a string, without a trailing slash.
    pub fn as_str(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns true if the base points at the local machine.
    pub fn is_localhost(&self) -> bool {
        is_localhost(&self.0)
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_localhost(url)) {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must not carry a query or fragment".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

fn is_localhost(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]" || h == "::1")
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BaseUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let base = BaseUrl::new("https://api.littlelemon.example").unwrap();
        assert_eq!(base.host(), Some("api.littlelemon.example"));
        assert!(!base.is_localhost());
    }

    #[test]
    fn valid_localhost_http() {
        let base = BaseUrl::new("http://localhost:3000/api").unwrap();
        assert!(base.is_localhost());
        assert_eq!(base.as_str(), "http://localhost:3000/api");
    }

    #[test]
    fn http_loopback_ip_is_allowed() {
        assert!(BaseUrl::new("http://127.0.0.1:8080").is_ok());
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(BaseUrl::new("http://api.littlelemon.example").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(BaseUrl::new("/api").is_err());
    }

    #[test]
    fn rejects_query_strings() {
        assert!(BaseUrl::new("https://api.example/api?x=1").is_err());
    }

    #[test]
    fn resolve_joins_with_single_slash() {
        let base = BaseUrl::new("http://localhost:3000/api/").unwrap();
        assert_eq!(
            base.resolve("/auth/login"),
            "http://localhost:3000/api/auth/login"
        );
        assert_eq!(
            base.resolve("auth/login"),
            "http://localhost:3000/api/auth/login"
        );
    }

    #[test]
    fn resolve_passes_absolute_targets_through() {
        let base = BaseUrl::new("http://localhost:3000/api").unwrap();
        assert_eq!(
            base.resolve("https://other.example/x"),
            "https://other.example/x"
        );
        assert_eq!(
            base.resolve("http://127.0.0.1:9/y"),
            "http://127.0.0.1:9/y"
        );
    }

    #[test]
    fn root_base_has_no_trailing_slash() {
        let base = BaseUrl::new("https://api.example/").unwrap();
        assert_eq!(base.to_string(), "https://api.example");
        assert_eq!(base.resolve("/menu"), "https://api.example/menu");
    }
}

//! Credentials, cookies and form login for servers that require a session.

use std::fmt;
use std::str::FromStr;

/// HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A cookie sent with every request of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cookie {0:?}: expected NAME=VALUE")]
pub struct ParseCookieError(String);

impl FromStr for Cookie {
    type Err = ParseCookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| ParseCookieError(s.to_string()))?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || name.contains([';', ' ', '\r', '\n']) {
            return Err(ParseCookieError(s.to_string()));
        }
        // A `;` would start another cookie in the joined header.
        if value.contains([';', '\r', '\n']) {
            return Err(ParseCookieError(s.to_string()));
        }
        Ok(Cookie {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// `Cookie` request header value: `a=1; b=2`.
pub(crate) fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Form login performed before the download. Cookies set by the response are
/// kept by the session and sent with the following requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

impl LoginForm {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn encoded_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}

//! Auth configuration types
//!
//! [`AuthSpec`] is the declarative form written in a source document;
//! [`AuthConfig`] is the resolved form holding actual credential values.

use crate::error::{Error, Result};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// Declarative auth block as written in a source document
///
/// Credentials are never written in the document itself; each variant
/// names the environment variables that hold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthSpec {
    /// Bearer token in the Authorization header
    Bearer {
        /// Environment variable holding the token
        token_env: String,
    },
    /// HTTP Basic authentication
    Basic {
        /// Environment variable holding the username
        username_env: String,
        /// Environment variable holding the password
        password_env: String,
    },
    /// API key placed in a named header
    ApiKey {
        /// Header to carry the key
        header: String,
        /// Environment variable holding the key
        token_env: String,
        /// Optional prefix prepended to the value (e.g. "Token ")
        #[serde(default)]
        prefix: Option<String>,
    },
    /// No authentication required
    None,
}

impl AuthSpec {
    /// Resolve the named environment variables into credential values
    ///
    /// Called once at collector construction; a missing variable excludes
    /// the source rather than producing requests with empty credentials.
    pub fn resolve(&self) -> Result<AuthConfig> {
        match self {
            AuthSpec::Bearer { token_env } => Ok(AuthConfig::Bearer {
                token: read_env(token_env)?,
            }),
            AuthSpec::Basic {
                username_env,
                password_env,
            } => Ok(AuthConfig::Basic {
                username: read_env(username_env)?,
                password: read_env(password_env)?,
            }),
            AuthSpec::ApiKey {
                header,
                token_env,
                prefix,
            } => {
                let key = read_env(token_env)?;
                let value = match prefix {
                    Some(p) => format!("{p}{key}"),
                    None => key,
                };
                Ok(AuthConfig::ApiKey {
                    header: header.clone(),
                    value,
                })
            }
            AuthSpec::None => Ok(AuthConfig::None),
        }
    }
}

fn read_env(variable: &str) -> Result<String> {
    std::env::var(variable)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::missing_credential(variable))
}

/// Resolved credentials ready to apply to a request
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,
    /// Bearer token
    Bearer { token: String },
    /// Basic credentials
    Basic { username: String, password: String },
    /// API key header
    ApiKey { header: String, value: String },
}

impl AuthConfig {
    /// Apply the credentials to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            AuthConfig::None => req,
            AuthConfig::Bearer { token } => req.bearer_auth(token),
            AuthConfig::Basic { username, password } => req.basic_auth(username, Some(password)),
            AuthConfig::ApiKey { header, value } => req.header(header.as_str(), value.as_str()),
        }
    }
}

// Credential values must never leak into logs; Debug prints the scheme only.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::None => f.write_str("AuthConfig::None"),
            AuthConfig::Bearer { .. } => f.write_str("AuthConfig::Bearer { token: <redacted> }"),
            AuthConfig::Basic { .. } => {
                f.write_str("AuthConfig::Basic { credentials: <redacted> }")
            }
            AuthConfig::ApiKey { header, .. } => {
                write!(f, "AuthConfig::ApiKey {{ header: {header}, value: <redacted> }}")
            }
        }
    }
}

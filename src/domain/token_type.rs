use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of credential being issued. Governs the default lifetime and
/// which claims are included: refresh tokens carry a reduced claim set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Access,
    Refresh,
    ExtendedSession,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown token type '{0}'")]
pub struct UnknownTokenType(pub String);

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "ACCESS",
            TokenType::Refresh => "REFRESH",
            TokenType::ExtendedSession => "EXTENDED_SESSION",
        }
    }
}

impl FromStr for TokenType {
    type Err = UnknownTokenType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCESS" => Ok(TokenType::Access),
            "REFRESH" => Ok(TokenType::Refresh),
            "EXTENDED_SESSION" => Ok(TokenType::ExtendedSession),
            other => Err(UnknownTokenType(other.to_owned())),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

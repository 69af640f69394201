//! Collectible tokens.
//!
//! A token's identity is fixed at mint time by its home cell and serial; only
//! the container holding it changes afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cells::CellId;

/// An individually identified collectible unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TokenRecord", into = "TokenRecord")]
pub struct Token {
    pub i: i32,
    pub j: i32,
    pub serial: u32,
}

impl Token {
    pub fn new(cell: CellId, serial: u32) -> Self {
        Self {
            i: cell.i,
            j: cell.j,
            serial,
        }
    }

    /// Cell the token was minted in.
    pub fn home(&self) -> CellId {
        CellId::new(self.i, self.j)
    }

    /// Globally unique identity string, `"{i}:{j}#{serial}"`.
    pub fn identity(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.i, self.j, self.serial)
    }
}

/// Persisted form of a token, carrying its identity string alongside the
/// fields it is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub i: i32,
    pub j: i32,
    pub serial: u32,
    pub identity: String,
}

/// Stored identity string disagrees with the stored fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("token identity {found:?} does not match its fields (expected {expected:?})")]
pub struct TokenMismatch {
    pub expected: String,
    pub found: String,
}

impl From<Token> for TokenRecord {
    fn from(t: Token) -> Self {
        Self {
            i: t.i,
            j: t.j,
            serial: t.serial,
            identity: t.identity(),
        }
    }
}

impl TryFrom<TokenRecord> for Token {
    type Error = TokenMismatch;

    fn try_from(r: TokenRecord) -> Result<Self, Self::Error> {
        let token = Token {
            i: r.i,
            j: r.j,
            serial: r.serial,
        };
        let expected = token.identity();
        if expected != r.identity {
            return Err(TokenMismatch {
                expected,
                found: r.identity,
            });
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_format() {
        let t = Token::new(CellId::new(369894, -1220628), 3);
        assert_eq!(t.identity(), "369894:-1220628#3");
        assert_eq!(t.home(), CellId::new(369894, -1220628));
    }

    #[test]
    fn serializes_with_identity() {
        let t = Token::new(CellId::new(1, -2), 0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"i":1,"j":-2,"serial":0,"identity":"1:-2#0"}"#);
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn rejects_tampered_identity() {
        let json = r#"{"i":1,"j":-2,"serial":0,"identity":"1:-2#9"}"#;
        assert!(serde_json::from_str::<Token>(json).is_err());
    }
}

//! Player inventory and the collect/deposit protocol.
//!
//! Both directions move exactly one token, taken from the top (most recently
//! added end) of the source and pushed onto the top of the destination. A
//! declined transfer leaves both containers exactly as they were.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::Cache;
use crate::token::Token;

/// Tokens held by the player, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    tokens: Vec<Token>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token that the next deposit would give away.
    pub fn top(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Status line shown to the player.
    pub fn describe(&self) -> String {
        match self.tokens.last() {
            None => "Inventory: empty".to_string(),
            Some(top) => format!("Inventory: {} tokens (top {})", self.tokens.len(), top),
        }
    }
}

/// Source side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Cache,
    Inventory,
}

/// Why a transfer was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("the {0:?} holds no tokens")]
    Empty(Container),
}

/// Move the top token of `cache` into `inventory`.
pub fn collect(cache: &mut Cache, inventory: &mut Inventory) -> Result<Token, TransferError> {
    let token = cache.tokens.pop().ok_or(TransferError::Empty(Container::Cache))?;
    inventory.tokens.push(token);
    Ok(token)
}

/// Move the top token of `inventory` into `cache`.
pub fn deposit(cache: &mut Cache, inventory: &mut Inventory) -> Result<Token, TransferError> {
    let token = inventory.tokens.pop().ok_or(TransferError::Empty(Container::Inventory))?;
    cache.tokens.push(token);
    Ok(token)
}

//! In-memory roster of ninjas
//!
//! The roster is the single source of truth for what is rendered and what
//! gets written back. Ninjas are addressed by position: the remote document
//! carries no identifiers, so position in this list and position in the
//! stored array must line up for updates to hit the right ninja.

use crate::error::{SyncError, SyncResult, ValidationError};
use crate::models::{normalize_name, Ninja};

/// Ordered list of ninjas, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    ninjas: Vec<Ninja>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole roster (used after a successful load)
    pub fn replace(&mut self, ninjas: Vec<Ninja>) {
        self.ninjas = ninjas;
    }

    pub fn ninjas(&self) -> &[Ninja] {
        &self.ninjas
    }

    pub fn get(&self, index: usize) -> Option<&Ninja> {
        self.ninjas.get(index)
    }

    pub fn len(&self) -> usize {
        self.ninjas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ninjas.is_empty()
    }

    /// Owned copy of the current list, handed to the save queue
    pub fn snapshot(&self) -> Vec<Ninja> {
        self.ninjas.clone()
    }

    /// Validate and append a new ninja, returning its position
    ///
    /// The name is trimmed and uppercased. Empty names and negative
    /// starting balances are rejected without touching the roster.
    pub fn append(&mut self, name: &str, bucks: i64) -> Result<usize, ValidationError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if bucks < 0 {
            return Err(ValidationError::NegativeBalance(bucks));
        }

        self.ninjas.push(Ninja { name, bucks });
        Ok(self.ninjas.len() - 1)
    }

    /// Add `delta` (possibly negative) to the balance at `index`
    ///
    /// Returns the new balance.
    pub fn apply_delta(&mut self, index: usize, delta: i64) -> SyncResult<i64> {
        let len = self.ninjas.len();
        let ninja = self
            .ninjas
            .get_mut(index)
            .ok_or(SyncError::IndexOutOfRange { index, len })?;

        ninja.bucks = ninja
            .bucks
            .checked_add(delta)
            .ok_or(SyncError::BalanceOverflow { index })?;
        Ok(ninja.bucks)
    }
}

/// Check a per-row adjustment amount
///
/// Amounts must be strictly positive for both giving and spending; spending
/// negates the same amount.
pub fn validate_amount(amount: i64) -> Result<i64, ValidationError> {
    if amount <= 0 {
        Err(ValidationError::NonPositiveAmount(amount))
    } else {
        Ok(amount)
    }
}

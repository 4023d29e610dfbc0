//! Native base-asset balances
//!
//! Tracks how much of the platform's native asset every address holds.
//! Value only moves between addresses through [`NativeBank::transfer`], so
//! the total supply is fixed once genesis funding is done.

use std::collections::{HashMap, HashSet};

use types::ids::Address;
use types::numeric::Amount;

use crate::errors::NativeError;
use crate::journal::{Checkpoint, Journal};

/// Previous value of something a write replaced.
#[derive(Debug, Clone)]
enum Undo {
    Balance(Address, Option<Amount>),
    Rejecting(Address, bool),
    Supply(Amount),
}

#[derive(Debug, Clone, Default)]
pub struct NativeBank {
    balances: HashMap<Address, Amount>,
    /// Addresses with no payable receive hook
    rejecting: HashSet<Address>,
    total_supply: Amount,
    journal: Journal<Undo>,
}

impl NativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Genesis allocation: credit `amount` to `address` out of thin air.
    pub fn fund(&mut self, address: Address, amount: Amount) -> Result<(), NativeError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(NativeError::Overflow)?;
        let balance = self
            .balance_of(&address)
            .checked_add(amount)
            .ok_or(NativeError::Overflow)?;
        self.set_balance(address, balance);
        self.journal.record(Undo::Supply(self.total_supply));
        self.total_supply = supply;
        Ok(())
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Mark `address` as refusing (or accepting again) incoming value.
    pub fn reject_incoming(&mut self, address: Address, reject: bool) {
        let was_rejecting = if reject {
            !self.rejecting.insert(address)
        } else {
            self.rejecting.remove(&address)
        };
        self.journal.record(Undo::Rejecting(address, was_rejecting));
    }

    pub fn rejects_incoming(&self, address: &Address) -> bool {
        self.rejecting.contains(address)
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// A zero-value transfer still fails when the recipient rejects value.
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), NativeError> {
        if self.rejects_incoming(&to) {
            return Err(NativeError::Rejected);
        }

        let from_balance = self.balance_of(&from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(NativeError::InsufficientFunds {
                required: amount,
                available: from_balance,
            })?;
        let to_balance = if from == to { debited } else { self.balance_of(&to) };
        let credited = to_balance.checked_add(amount).ok_or(NativeError::Overflow)?;

        self.set_balance(from, debited);
        self.set_balance(to, credited);
        Ok(())
    }

    /// Start recording writes so they can be reverted.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.journal.open()
    }

    pub fn commit(&mut self, checkpoint: Checkpoint) {
        self.journal.commit(checkpoint);
    }

    /// Undo every write since `checkpoint`.
    pub fn revert(&mut self, checkpoint: Checkpoint) {
        for undo in self.journal.rollback(checkpoint) {
            match undo {
                Undo::Balance(address, Some(balance)) => {
                    self.balances.insert(address, balance);
                }
                Undo::Balance(address, None) => {
                    self.balances.remove(&address);
                }
                Undo::Rejecting(address, true) => {
                    self.rejecting.insert(address);
                }
                Undo::Rejecting(address, false) => {
                    self.rejecting.remove(&address);
                }
                Undo::Supply(supply) => self.total_supply = supply,
            }
        }
    }

    fn set_balance(&mut self, address: Address, balance: Amount) {
        let previous = self.balances.insert(address, balance);
        self.journal.record(Undo::Balance(address, previous));
    }
}

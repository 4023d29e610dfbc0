//! Fungible token collaborator
//!
//! The savings ledger only ever talks to a token through the [`Erc20`]
//! trait, so any implementation (including a misbehaving test double) can be
//! bound at deployment. [`Erc20Token`] is a standard in-memory token with
//! owner-authorized delegated transfers.

use std::collections::HashMap;

use tracing::debug;
use types::ids::Address;
use types::numeric::Amount;

use crate::errors::TokenError;
use crate::events::TokenEvent;
use crate::journal::{Checkpoint, Journal};

/// Public surface of an ERC20-style token as consumed by the savings ledger.
///
/// `caller` is the account on whose authority the call runs (the message
/// sender). The boolean results mirror the standard: a token may refuse a
/// transfer by returning `Ok(false)` instead of an error.
///
/// The ledger wraps each of its calls in `checkpoint` and then `commit` or
/// `revert`; checkpoints nest.
pub trait Erc20 {
    fn balance_of(&self, owner: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<bool, TokenError>;

    fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<bool, TokenError>;

    /// Start recording state changes so they can be reverted.
    fn checkpoint(&mut self) -> Checkpoint;

    /// Keep every change since `checkpoint`.
    fn commit(&mut self, checkpoint: Checkpoint);

    /// Undo every change since `checkpoint`.
    fn revert(&mut self, checkpoint: Checkpoint);
}

#[derive(Debug, Clone)]
enum Undo {
    Balance(Address, Option<Amount>),
    Allowance(Address, Address, Option<Amount>),
    Emitted,
}

/// In-memory standard token.
///
/// The whole initial supply is minted to the deployer; there is no further
/// minting or burning.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    name: String,
    symbol: String,
    decimals: u32,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), Amount>,
    events: Vec<TokenEvent>,
    journal: Journal<Undo>,
}

impl Erc20Token {
    /// Deploy a token, minting `initial_supply` to `deployer`.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u32,
        deployer: Address,
        initial_supply: Amount,
    ) -> Self {
        let mut balances = HashMap::new();
        if !initial_supply.is_zero() {
            balances.insert(deployer, initial_supply);
        }
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
            events: vec![TokenEvent::Transfer {
                from: Address::ZERO,
                to: deployer,
                value: initial_supply,
            }],
            journal: Journal::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Set `spender`'s allowance over `caller`'s tokens, replacing any previous value.
    pub fn approve(&mut self, caller: Address, spender: Address, amount: Amount) -> Result<bool, TokenError> {
        if spender.is_zero() {
            return Err(TokenError::InvalidReceiver);
        }
        self.set_allowance(caller, spender, amount);
        self.emit(TokenEvent::Approval {
            owner: caller,
            spender,
            value: amount,
        });
        Ok(true)
    }

    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidReceiver);
        }

        let from_balance = self.balance_of(&from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                required: amount,
                available: from_balance,
            })?;
        let to_balance = if from == to { debited } else { self.balance_of(&to) };
        let credited = to_balance.checked_add(amount).ok_or(TokenError::Overflow)?;

        self.set_balance(from, debited);
        self.set_balance(to, credited);
        self.emit(TokenEvent::Transfer {
            from,
            to,
            value: amount,
        });
        Ok(())
    }

    fn set_balance(&mut self, owner: Address, balance: Amount) {
        let previous = self.balances.insert(owner, balance);
        self.journal.record(Undo::Balance(owner, previous));
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        let previous = self.allowances.insert((owner, spender), amount);
        self.journal.record(Undo::Allowance(owner, spender, previous));
    }

    fn emit(&mut self, event: TokenEvent) {
        self.events.push(event);
        self.journal.record(Undo::Emitted);
    }
}

impl Erc20 for Erc20Token {
    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(Amount::ZERO)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<bool, TokenError> {
        self.move_balance(caller, to, amount)?;
        debug!(token = %self.symbol, from = %caller, to = %to, amount = %amount, "Token transfer");
        Ok(true)
    }

    fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<bool, TokenError> {
        let allowed = self.allowance(&from, &caller);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance {
                required: amount,
                available: allowed,
            })?;

        self.move_balance(from, to, amount)?;
        self.set_allowance(from, caller, remaining);
        debug!(
            token = %self.symbol,
            spender = %caller,
            from = %from,
            to = %to,
            amount = %amount,
            "Token delegated transfer"
        );
        Ok(true)
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.journal.open()
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        self.journal.commit(checkpoint);
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        for undo in self.journal.rollback(checkpoint) {
            match undo {
                Undo::Balance(owner, Some(balance)) => {
                    self.balances.insert(owner, balance);
                }
                Undo::Balance(owner, None) => {
                    self.balances.remove(&owner);
                }
                Undo::Allowance(owner, spender, Some(amount)) => {
                    self.allowances.insert((owner, spender), amount);
                }
                Undo::Allowance(owner, spender, None) => {
                    self.allowances.remove(&(owner, spender));
                }
                Undo::Emitted => {
                    self.events.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_token() -> (Erc20Token, Address) {
        let owner = Address::from_label("owner");
        let token = Erc20Token::new("Coval", "COV", 18, owner, Amount::new(1_000));
        (token, owner)
    }

    #[test]
    fn test_initial_supply_minted_to_deployer() {
        let (token, owner) = setup_token();
        assert_eq!(token.balance_of(&owner), Amount::new(1_000));
        assert_eq!(token.total_supply(), Amount::new(1_000));
        assert_eq!(token.symbol(), "COV");
        assert!(matches!(
            token.events()[0],
            TokenEvent::Transfer { from, .. } if from.is_zero()
        ));
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (mut token, owner) = setup_token();
        let bob = Address::from_label("bob");
        assert!(token.transfer(owner, bob, Amount::new(300)).unwrap());
        assert_eq!(token.balance_of(&owner), Amount::new(700));
        assert_eq!(token.balance_of(&bob), Amount::new(300));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (mut token, _) = setup_token();
        let bob = Address::from_label("bob");
        let result = token.transfer(bob, Address::from_label("carol"), Amount::new(1));
        assert_eq!(
            result,
            Err(TokenError::InsufficientBalance {
                required: Amount::new(1),
                available: Amount::ZERO,
            })
        );
    }

    #[test]
    fn test_transfer_to_zero_address_rejected() {
        let (mut token, owner) = setup_token();
        let result = token.transfer(owner, Address::ZERO, Amount::new(1));
        assert_eq!(result, Err(TokenError::InvalidReceiver));
        assert_eq!(token.balance_of(&owner), Amount::new(1_000));
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let (mut token, owner) = setup_token();
        token.transfer(owner, owner, Amount::new(400)).unwrap();
        assert_eq!(token.balance_of(&owner), Amount::new(1_000));
    }

    #[test]
    fn test_approve_and_transfer_from() {
        let (mut token, owner) = setup_token();
        let spender = Address::from_label("spender");
        let bob = Address::from_label("bob");

        token.approve(owner, spender, Amount::new(500)).unwrap();
        assert_eq!(token.allowance(&owner, &spender), Amount::new(500));

        token.transfer_from(spender, owner, bob, Amount::new(200)).unwrap();
        assert_eq!(token.balance_of(&bob), Amount::new(200));
        assert_eq!(token.allowance(&owner, &spender), Amount::new(300));
    }

    #[test]
    fn test_transfer_from_exceeding_allowance() {
        let (mut token, owner) = setup_token();
        let spender = Address::from_label("spender");
        token.approve(owner, spender, Amount::new(10)).unwrap();

        let result = token.transfer_from(spender, owner, spender, Amount::new(11));
        assert_eq!(
            result,
            Err(TokenError::InsufficientAllowance {
                required: Amount::new(11),
                available: Amount::new(10),
            })
        );
        assert_eq!(token.allowance(&owner, &spender), Amount::new(10));
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let (mut token, _) = setup_token();
        let bob = Address::from_label("bob");
        let spender = Address::from_label("spender");
        token.approve(bob, spender, Amount::new(50)).unwrap();

        let result = token.transfer_from(spender, bob, spender, Amount::new(50));
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(token.allowance(&bob, &spender), Amount::new(50));
    }

    #[test]
    fn test_revert_undoes_transfers_approvals_and_events() {
        let (mut token, owner) = setup_token();
        let spender = Address::from_label("spender");
        let bob = Address::from_label("bob");
        token.approve(owner, spender, Amount::new(100)).unwrap();
        let events = token.events().len();

        let checkpoint = token.checkpoint();
        token.transfer_from(spender, owner, bob, Amount::new(60)).unwrap();
        token.approve(bob, spender, Amount::new(5)).unwrap();
        token.revert(checkpoint);

        assert_eq!(token.balance_of(&owner), Amount::new(1_000));
        assert_eq!(token.balance_of(&bob), Amount::ZERO);
        assert_eq!(token.allowance(&owner, &spender), Amount::new(100));
        assert_eq!(token.allowance(&bob, &spender), Amount::ZERO);
        assert_eq!(token.events().len(), events);
    }

    #[test]
    fn test_commit_forgets_history() {
        let (mut token, owner) = setup_token();
        let bob = Address::from_label("bob");
        for _ in 0..10 {
            let checkpoint = token.checkpoint();
            token.transfer(owner, bob, Amount::new(1)).unwrap();
            token.commit(checkpoint);
            assert!(token.journal.is_empty());
        }
        assert_eq!(token.balance_of(&bob), Amount::new(10));
    }

    #[test]
    fn test_approve_overwrites() {
        let (mut token, owner) = setup_token();
        let spender = Address::from_label("spender");
        token.approve(owner, spender, Amount::new(10)).unwrap();
        token.approve(owner, spender, Amount::new(3)).unwrap();
        assert_eq!(token.allowance(&owner, &spender), Amount::new(3));
    }
}

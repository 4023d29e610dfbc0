//! Contract events
//!
//! Events are immutable records emitted by successful contract calls. A call
//! that fails leaves no event behind.

use serde::{Deserialize, Serialize};
use types::ids::{Address, TxId};
use types::numeric::Amount;

/// Base asset credited to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherDeposited {
    pub tx_id: TxId,
    pub account: Address,
    pub amount: Amount,
}

/// Whole base-asset record paid back to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherWithdrawn {
    pub tx_id: TxId,
    pub account: Address,
    pub amount: Amount,
}

/// Token pulled from an account and credited to its record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDeposited {
    pub tx_id: TxId,
    pub account: Address,
    pub amount: Amount,
}

/// Token debited from a record and sent back to its account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWithdrawn {
    pub tx_id: TxId,
    pub account: Address,
    pub amount: Amount,
}

/// Enum wrapper for all savings ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingEvent {
    EtherDeposited(EtherDeposited),
    EtherWithdrawn(EtherWithdrawn),
    TokenDeposited(TokenDeposited),
    TokenWithdrawn(TokenWithdrawn),
}

impl SavingEvent {
    pub fn tx_id(&self) -> TxId {
        match self {
            SavingEvent::EtherDeposited(e) => e.tx_id,
            SavingEvent::EtherWithdrawn(e) => e.tx_id,
            SavingEvent::TokenDeposited(e) => e.tx_id,
            SavingEvent::TokenWithdrawn(e) => e.tx_id,
        }
    }

    pub fn account(&self) -> Address {
        match self {
            SavingEvent::EtherDeposited(e) => e.account,
            SavingEvent::EtherWithdrawn(e) => e.account,
            SavingEvent::TokenDeposited(e) => e.account,
            SavingEvent::TokenWithdrawn(e) => e.account,
        }
    }
}

/// Token events, as a standard fungible token emits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    Transfer {
        from: Address,
        to: Address,
        value: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: Amount,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saving_event_json_shape() {
        let event = SavingEvent::TokenDeposited(TokenDeposited {
            tx_id: TxId::new(),
            account: Address::from_label("account1"),
            amount: Amount::new(1_000),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["TokenDeposited"]["amount"], "1000");
        let deser: SavingEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_saving_event_accessors() {
        let tx_id = TxId::new();
        let account = Address::from_label("owner");
        let event = SavingEvent::EtherWithdrawn(EtherWithdrawn {
            tx_id,
            account,
            amount: Amount::new(7),
        });
        assert_eq!(event.tx_id(), tx_id);
        assert_eq!(event.account(), account);
    }
}

//! Savings ledger: custodial deposits and withdrawals of two assets
//!
//! Holds the native base asset and one bound ERC20-style token on behalf of
//! depositors:
//! - Per-account records for both asset classes, zero until first deposit
//! - Token deposits pulled through a pre-authorized delegated transfer
//! - Withdrawals only ever pay an account its own recorded balance
//! - All-or-nothing calls: a failing call leaves no trace in the ledger,
//!   the token or the native bank
//!
//! Withdrawals follow checks-effects-interactions: the record is debited
//! before the outbound transfer starts, so a receiver that calls back into
//! the ledger while being paid observes the already-debited record.
//!
//! Rollback is journaled: the ledger, the token and the native bank each
//! record what a call overwrites, so reverting costs as much as the call
//! touched.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};
use types::ids::{Address, TxId};
use types::numeric::{format_ether, Amount};

use crate::errors::{Action, AssetKind, NativeError, SavingError};
use crate::events::{EtherDeposited, EtherWithdrawn, SavingEvent, TokenDeposited, TokenWithdrawn};
use crate::journal::{Checkpoint, Journal};
use crate::native::NativeBank;
use crate::token::{Erc20, Erc20Token};

/// What the ledger holds for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountBalance {
    pub ether: Amount,
    pub token: Amount,
}

/// Payable receive hook of an address.
///
/// Runs while the ledger pays base asset to the address, with full access to
/// the ledger. Returning an error rejects the payment, which fails and rolls
/// back the whole paying call.
pub trait EtherReceiver<T> {
    fn on_receive(
        &mut self,
        saving: &mut Saving<T>,
        from: Address,
        amount: Amount,
    ) -> Result<(), SavingError>;
}

/// Registry entry of a receive hook.
enum ReceiverSlot<T> {
    Ready(Box<dyn EtherReceiver<T>>),
    /// The hook is executing; it is handed back when it returns.
    Running,
}

/// Previous value of something a ledger write replaced.
enum Undo<T> {
    Record(Address, Option<AccountBalance>),
    Receiver(Address, Option<ReceiverSlot<T>>),
    Emitted,
    Drained(Vec<SavingEvent>),
}

/// Open checkpoints of one call, one per stateful component.
struct CallCheckpoint {
    ledger: Checkpoint,
    token: Checkpoint,
    native: Checkpoint,
}

/// Core savings ledger.
///
/// The token reference is fixed at construction; there is no way to rebind
/// it. `token_mut` and `native_mut` exist so other accounts can act on the
/// same collaborators (approve, transfer, fund) between ledger calls.
pub struct Saving<T = Erc20Token> {
    address: Address,
    token: T,
    native: NativeBank,
    /// Records: account -> (ether, token)
    balances: HashMap<Address, AccountBalance>,
    receivers: HashMap<Address, ReceiverSlot<T>>,
    /// Emitted events log (append-only)
    events: Vec<SavingEvent>,
    journal: Journal<Undo<T>>,
}

impl<T: Erc20> Saving<T> {
    /// Deploy a ledger at `address`, bound to `token` and settling base asset
    /// through `native`.
    pub fn new(address: Address, token: T, native: NativeBank) -> Self {
        info!(address = %address, "Savings ledger deployed");
        Self {
            address,
            token,
            native,
            balances: HashMap::new(),
            receivers: HashMap::new(),
            events: Vec::new(),
            journal: Journal::new(),
        }
    }

    // ───────────────────────── Base Asset ─────────────────────────

    /// Deposit the attached `value` of base asset.
    ///
    /// Zero is accepted and records nothing. Fails only when the caller does
    /// not hold `value`.
    pub fn deposit_ether(&mut self, caller: Address, value: Amount) -> Result<TxId, SavingError> {
        self.atomically("deposit_ether", |ledger| {
            let ledger_address = ledger.address;
            ledger.native.transfer(caller, ledger_address, value)?;

            let record = ledger.record_mut(caller);
            record.ether = record.ether.checked_add(value).ok_or(SavingError::Overflow)?;

            let tx_id = TxId::new();
            ledger.emit(SavingEvent::EtherDeposited(EtherDeposited {
                tx_id,
                account: caller,
                amount: value,
            }));
            info!(caller = %caller, amount = %format_ether(value), "Ether deposited");
            Ok(tx_id)
        })
    }

    /// Withdraw the caller's whole base-asset record.
    ///
    /// An empty record is rejected with `InsufficientBalance`.
    pub fn withdraw_ether(&mut self, caller: Address) -> Result<TxId, SavingError> {
        self.atomically("withdraw_ether", |ledger| {
            let amount = ledger.check_user_ether_balance(&caller);
            if amount.is_zero() {
                return Err(SavingError::InsufficientBalance {
                    asset: AssetKind::Ether,
                    required: Amount::new(1),
                    available: Amount::ZERO,
                });
            }

            ledger.record_mut(caller).ether = Amount::ZERO;
            ledger.send_ether(caller, amount)?;

            let tx_id = TxId::new();
            ledger.emit(SavingEvent::EtherWithdrawn(EtherWithdrawn {
                tx_id,
                account: caller,
                amount,
            }));
            info!(caller = %caller, amount = %format_ether(amount), "Ether withdrawn");
            Ok(tx_id)
        })
    }

    // ───────────────────────── Token ─────────────────────────

    /// Pull `amount` of token from the caller and credit its record.
    ///
    /// The caller must hold `amount` and have approved the ledger for it.
    pub fn deposit_erc20(&mut self, caller: Address, amount: Amount) -> Result<TxId, SavingError> {
        self.atomically("deposit_erc20", |ledger| {
            if amount.is_zero() {
                return Err(SavingError::ZeroAmount {
                    action: Action::Save,
                });
            }

            let held = ledger.token.balance_of(&caller);
            if held < amount {
                return Err(SavingError::InsufficientBalance {
                    asset: AssetKind::Token,
                    required: amount,
                    available: held,
                });
            }

            let ledger_address = ledger.address;
            if !ledger
                .token
                .transfer_from(ledger_address, caller, ledger_address, amount)?
            {
                return Err(SavingError::TransferFailed {
                    asset: AssetKind::Token,
                });
            }

            let record = ledger.record_mut(caller);
            record.token = record.token.checked_add(amount).ok_or(SavingError::Overflow)?;

            let tx_id = TxId::new();
            ledger.emit(SavingEvent::TokenDeposited(TokenDeposited {
                tx_id,
                account: caller,
                amount,
            }));
            info!(caller = %caller, amount = %amount, "Token deposited");
            Ok(tx_id)
        })
    }

    /// Debit `amount` from the caller's token record and send it back.
    pub fn withdraw_erc20(&mut self, caller: Address, amount: Amount) -> Result<TxId, SavingError> {
        self.atomically("withdraw_erc20", |ledger| {
            if amount.is_zero() {
                return Err(SavingError::ZeroAmount {
                    action: Action::Withdraw,
                });
            }

            let record = ledger.record_mut(caller);
            let available = record.token;
            record.token = available
                .checked_sub(amount)
                .ok_or(SavingError::InsufficientBalance {
                    asset: AssetKind::Token,
                    required: amount,
                    available,
                })?;

            let ledger_address = ledger.address;
            if !ledger.token.transfer(ledger_address, caller, amount)? {
                return Err(SavingError::TransferFailed {
                    asset: AssetKind::Token,
                });
            }

            let tx_id = TxId::new();
            ledger.emit(SavingEvent::TokenWithdrawn(TokenWithdrawn {
                tx_id,
                account: caller,
                amount,
            }));
            info!(caller = %caller, amount = %amount, "Token withdrawn");
            Ok(tx_id)
        })
    }

    // ───────────────────────── Balance Queries ─────────────────────────

    /// `(ether, token)` recorded for `account`.
    pub fn check_user_balance(&self, account: &Address) -> (Amount, Amount) {
        let record = self.record(account);
        (record.ether, record.token)
    }

    pub fn check_user_ether_balance(&self, account: &Address) -> Amount {
        self.record(account).ether
    }

    pub fn check_user_erc20_balance(&self, account: &Address) -> Amount {
        self.record(account).token
    }

    /// `(ether, token)` actually held by the ledger address.
    pub fn check_contract_balance(&self) -> (Amount, Amount) {
        (
            self.native.balance_of(&self.address),
            self.token.balance_of(&self.address),
        )
    }

    /// Sum of all records per asset; equals `check_contract_balance` unless
    /// tokens were sent to the ledger address directly.
    pub fn recorded_totals(&self) -> Result<(Amount, Amount), SavingError> {
        let ether = Amount::checked_sum(self.balances.values().map(|b| b.ether))
            .ok_or(SavingError::Overflow)?;
        let token = Amount::checked_sum(self.balances.values().map(|b| b.token))
            .ok_or(SavingError::Overflow)?;
        Ok((ether, token))
    }

    // ───────────────────────── Collaborators ─────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn native(&self) -> &NativeBank {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut NativeBank {
        &mut self.native
    }

    /// Install a payable receive hook for `address`, replacing any previous one.
    ///
    /// A hook may replace or remove itself while it runs.
    pub fn register_receiver(&mut self, address: Address, receiver: Box<dyn EtherReceiver<T>>) {
        let previous = self.receivers.insert(address, ReceiverSlot::Ready(receiver));
        self.journal.record(Undo::Receiver(address, previous));
    }

    pub fn remove_receiver(&mut self, address: &Address) -> bool {
        match self.receivers.remove(address) {
            Some(previous) => {
                self.journal.record(Undo::Receiver(*address, Some(previous)));
                true
            }
            None => false,
        }
    }

    pub fn has_receiver(&self, address: &Address) -> bool {
        self.receivers.contains_key(address)
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[SavingEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    ///
    /// Inside a call that later fails, the drained events are put back.
    pub fn drain_events(&mut self) -> Vec<SavingEvent> {
        let drained = std::mem::take(&mut self.events);
        if self.journal.is_open() {
            self.journal.record(Undo::Drained(drained.clone()));
        }
        drained
    }

    // ───────────────────────── Internals ─────────────────────────

    fn record(&self, account: &Address) -> AccountBalance {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn record_mut(&mut self, account: Address) -> &mut AccountBalance {
        let previous = self.balances.get(&account).copied();
        self.journal.record(Undo::Record(account, previous));
        self.balances.entry(account).or_default()
    }

    fn emit(&mut self, event: SavingEvent) {
        self.events.push(event);
        self.journal.record(Undo::Emitted);
    }

    /// Pay base asset out of the ledger, running the recipient's hook.
    fn send_ether(&mut self, to: Address, amount: Amount) -> Result<(), SavingError> {
        let from = self.address;
        self.native
            .transfer(from, to, amount)
            .map_err(|err| match err {
                NativeError::Rejected => SavingError::TransferFailed {
                    asset: AssetKind::Ether,
                },
                other => SavingError::Native(other),
            })?;

        // A running hook is not invoked again by a reentrant payment.
        let Some(mut receiver) = self.take_receiver(&to) else {
            return Ok(());
        };
        let outcome = receiver.on_receive(self, from, amount);
        self.hand_back_receiver(to, receiver);
        if let Err(err) = outcome {
            warn!(recipient = %to, error = %err, "Receive hook rejected payment");
            return Err(SavingError::TransferFailed {
                asset: AssetKind::Ether,
            });
        }
        Ok(())
    }

    fn take_receiver(&mut self, address: &Address) -> Option<Box<dyn EtherReceiver<T>>> {
        let slot = self.receivers.get_mut(address)?;
        match std::mem::replace(slot, ReceiverSlot::Running) {
            ReceiverSlot::Ready(receiver) => Some(receiver),
            ReceiverSlot::Running => None,
        }
    }

    /// Return a hook to its slot after it ran.
    ///
    /// If the hook replaced or removed itself, the slot is left as the hook
    /// set it, and the hook is kept only in the journal entry that recorded
    /// the change, so a revert still restores it.
    fn hand_back_receiver(&mut self, address: Address, receiver: Box<dyn EtherReceiver<T>>) {
        if let Some(slot) = self.receivers.get_mut(&address) {
            if matches!(slot, ReceiverSlot::Running) {
                *slot = ReceiverSlot::Ready(receiver);
                return;
            }
        }
        for undo in self.journal.entries_mut() {
            if let Undo::Receiver(changed, previous) = undo {
                if *changed == address && matches!(previous, Some(ReceiverSlot::Running)) {
                    *previous = Some(ReceiverSlot::Ready(receiver));
                    return;
                }
            }
        }
    }

    /// Run `body` as one all-or-nothing call.
    fn atomically<R>(
        &mut self,
        call: &'static str,
        body: impl FnOnce(&mut Self) -> Result<R, SavingError>,
    ) -> Result<R, SavingError> {
        let checkpoint = CallCheckpoint {
            ledger: self.journal.open(),
            token: self.token.checkpoint(),
            native: self.native.checkpoint(),
        };
        let result = body(self);
        match &result {
            Ok(_) => {
                debug!(call, "Call committed");
                self.journal.commit(checkpoint.ledger);
                self.token.commit(checkpoint.token);
                self.native.commit(checkpoint.native);
            }
            Err(err) => {
                warn!(call, error = %err, "Call reverted");
                self.revert(checkpoint);
            }
        }
        result
    }

    fn revert(&mut self, checkpoint: CallCheckpoint) {
        self.token.revert(checkpoint.token);
        self.native.revert(checkpoint.native);
        for undo in self.journal.rollback(checkpoint.ledger) {
            match undo {
                Undo::Record(account, Some(record)) => {
                    self.balances.insert(account, record);
                }
                Undo::Record(account, None) => {
                    self.balances.remove(&account);
                }
                Undo::Receiver(address, Some(slot)) => {
                    self.receivers.insert(address, slot);
                }
                Undo::Receiver(address, None) => {
                    self.receivers.remove(&address);
                }
                Undo::Emitted => {
                    self.events.pop();
                }
                Undo::Drained(events) => self.events = events,
            }
        }
    }
}

impl<T> fmt::Debug for Saving<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Saving")
            .field("address", &self.address)
            .field("accounts", &self.balances.len())
            .field("receivers", &self.receivers.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

//! Deployment fixture
//!
//! Builds a funded world from a [`DeploymentConfig`]: the token is deployed
//! by the first signer at nonce 0 with the whole supply minted to it, every
//! signer receives its genesis ether, and the savings ledger is deployed by
//! the same signer at nonce 1, bound to the token.

use tracing::info;
use types::ids::Address;
use types::numeric::format_units;

use crate::config::DeploymentConfig;
use crate::errors::ConfigError;
use crate::native::NativeBank;
use crate::saving::Saving;
use crate::token::Erc20Token;

/// A deployed savings ledger plus the signers that can call it.
#[derive(Debug)]
pub struct Deployment {
    pub saving: Saving<Erc20Token>,
    /// Address the token would live at on chain.
    pub token_address: Address,
    /// Signer addresses in config order; the first is the deployer.
    pub signers: Vec<Address>,
}

impl Deployment {
    pub fn owner(&self) -> Address {
        self.signers.first().copied().unwrap_or(Address::ZERO)
    }

    /// Signer address for a configured label.
    pub fn signer(&self, label: &str) -> Option<Address> {
        let address = Address::from_label(label);
        self.signers.contains(&address).then_some(address)
    }
}

pub fn deploy(config: &DeploymentConfig) -> Result<Deployment, ConfigError> {
    config.validate()?;
    let deployer = config
        .deployer_label()
        .map(Address::from_label)
        .ok_or(ConfigError::NoAccounts)?;

    let supply = config.initial_supply_units()?;
    let prefund = config.prefund_units()?;

    let token = Erc20Token::new(
        config.token.name.clone(),
        config.token.symbol.clone(),
        config.token.decimals,
        deployer,
        supply,
    );
    let token_address = Address::contract(&deployer, 0);

    let signers: Vec<Address> = config.accounts.iter().map(|label| Address::from_label(label)).collect();
    let mut native = NativeBank::new();
    for signer in &signers {
        native.fund(*signer, prefund)?;
    }

    let saving = Saving::new(Address::contract(&deployer, 1), token, native);
    info!(
        deployer = %deployer,
        token = %token_address,
        name = saving.token().name(),
        symbol = saving.token().symbol(),
        supply = %format_units(supply, saving.token().decimals()),
        saving = %saving.address(),
        signers = signers.len(),
        "Deployment complete"
    );

    Ok(Deployment {
        saving,
        token_address,
        signers,
    })
}

//! Wallet provider boundary
//!
//! The game reads the connected address to build reward claims and shows the
//! token balance. Connecting and network switching belong to the provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider found")]
    NoProvider,
    #[error("request rejected by user")]
    UserRejected,
    #[error("wallet is on chain {found}, expected {expected}")]
    WrongNetwork { found: String, expected: String },
    #[error("wallet not connected")]
    NotConnected,
    #[error("wallet provider: {0}")]
    Transport(String),
}

/// Chain the game's reward contract lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Hex chain id, e.g. "0x279f"
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub currency_symbol: String,
    pub decimals: u8,
}

/// What the game knows about the player's wallet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    pub address: Option<String>,
    pub is_connected: bool,
    pub chain_id: Option<String>,
    pub is_correct_network: bool,
    /// Formatted token balance
    pub token_balance: String,
}

impl WalletState {
    /// `0x1234...abcd` form for the HUD
    pub fn short_address(&self) -> String {
        match &self.address {
            Some(addr) if addr.len() > 10 => {
                format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
            }
            Some(addr) => addr.clone(),
            None => "Not Connected".to_string(),
        }
    }
}

pub trait WalletProvider {
    fn state(&self) -> &WalletState;
    fn connect(&mut self) -> Result<(), WalletError>;
    fn disconnect(&mut self);
    fn switch_network(&mut self) -> Result<(), WalletError>;
    fn refresh_balance(&mut self) -> Result<String, WalletError>;
}

/// Scriptable in-memory wallet
#[derive(Debug, Clone)]
pub struct MockWallet {
    pub network: NetworkConfig,
    /// Address handed out on connect; `None` means no provider installed
    pub account: Option<String>,
    /// Chain the wallet reports before any switch
    pub current_chain: String,
    pub balance: String,
    pub reject_requests: bool,
    state: WalletState,
}

impl MockWallet {
    pub fn new(network: NetworkConfig, account: Option<String>) -> Self {
        let current_chain = network.chain_id.clone();
        Self {
            network,
            account,
            current_chain,
            balance: "0".to_string(),
            reject_requests: false,
            state: WalletState {
                token_balance: "0".to_string(),
                ..Default::default()
            },
        }
    }
}

impl WalletProvider for MockWallet {
    fn state(&self) -> &WalletState {
        &self.state
    }

    fn connect(&mut self) -> Result<(), WalletError> {
        let account = self.account.clone().ok_or(WalletError::NoProvider)?;
        if self.reject_requests {
            return Err(WalletError::UserRejected);
        }
        self.state.address = Some(account);
        self.state.is_connected = true;
        self.state.chain_id = Some(self.current_chain.clone());
        self.state.is_correct_network = self.current_chain == self.network.chain_id;
        self.state.token_balance = self.balance.clone();
        log::info!("Wallet connected: {}", self.state.short_address());
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = WalletState {
            token_balance: "0".to_string(),
            ..Default::default()
        };
        log::info!("Wallet disconnected");
    }

    fn switch_network(&mut self) -> Result<(), WalletError> {
        if !self.state.is_connected {
            return Err(WalletError::NotConnected);
        }
        if self.reject_requests {
            return Err(WalletError::UserRejected);
        }
        self.current_chain = self.network.chain_id.clone();
        self.state.chain_id = Some(self.current_chain.clone());
        self.state.is_correct_network = true;
        log::info!("Switched to {}", self.network.chain_name);
        Ok(())
    }

    fn refresh_balance(&mut self) -> Result<String, WalletError> {
        if !self.state.is_connected {
            return Err(WalletError::NotConnected);
        }
        if !self.state.is_correct_network {
            return Err(WalletError::WrongNetwork {
                found: self.current_chain.clone(),
                expected: self.network.chain_id.clone(),
            });
        }
        self.state.token_balance = self.balance.clone();
        Ok(self.state.token_balance.clone())
    }
}

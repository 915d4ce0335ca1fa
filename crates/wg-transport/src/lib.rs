//! Collaborator seams for the wallet facade.
//!
//! The wallet-selection modal, the wallet transport, and the browser
//! session store are external systems; everything here is the contract
//! they are consumed through, so the core can be driven by fakes in tests
//! and swapped per target stack.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use wg_api_types::{ChainId, TxHash, WalletAddress};

/// Raw failure surfaced by a transport or the modal: a symbolic error
/// name when the underlying stack provides one, plus its message.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub name: Option<String>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
        }
    }

    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStatus {
    pub is_connected: bool,
    pub address: Option<WalletAddress>,
}

impl AccountStatus {
    pub fn disconnected() -> Self {
        Self {
            is_connected: false,
            address: None,
        }
    }

    pub fn connected(address: impl Into<String>) -> Self {
        Self {
            is_connected: true,
            address: Some(WalletAddress(address.into())),
        }
    }
}

/// Lifecycle events delivered by the wallet-selection modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    SelectWallet,
    ModalClose,
    ConnectError(TransportError),
}

/// A single contract invocation: the ABI fragment for one function plus
/// its encoded arguments.
#[derive(Debug, Clone, Serialize)]
pub struct ContractCall {
    pub address: String,
    pub function_name: String,
    pub abi: serde_json::Value,
    pub args: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenMetadata {
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: u8,
}

/// JSON-RPC request surface of a wallet or public client.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;
}

/// The wallet protocol stack, consumed as a black box.
#[async_trait]
pub trait WalletTransport: Send + Sync {
    /// Snapshot of the wallet's current account state.
    fn account(&self) -> AccountStatus;

    /// Subscribes to account-change notifications. Dropping the receiver
    /// deregisters the watch.
    fn watch_account(&self) -> mpsc::UnboundedReceiver<AccountStatus>;

    async fn switch_network(&self, chain_id: ChainId) -> Result<(), TransportError>;

    /// Client bound to the connected wallet, if any.
    async fn wallet_client(&self) -> Option<Arc<dyn RpcClient>>;

    /// Read-only client that works without a connected wallet.
    async fn public_client(&self) -> Arc<dyn RpcClient>;

    async fn read_contract(
        &self,
        call: &ContractCall,
    ) -> Result<serde_json::Value, TransportError>;

    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash, TransportError>;

    async fn fetch_token(&self, address: &str) -> Result<TokenMetadata, TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// The wallet-selection modal UI, consumed as a black box.
pub trait ModalUi: Send + Sync {
    fn open(&self);

    /// Subscribes to modal lifecycle events. Dropping the receiver
    /// deregisters the listener.
    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<ModalEvent>;

    /// The chain the modal currently reports as selected.
    fn selected_network_id(&self) -> Option<u64>;

    fn reset_account(&self);
    fn reset_network(&self);
    fn reset_wc_connection(&self);
}

/// Enumerable key/value store holding prior wallet-session state.
pub trait SessionStore: Send + Sync {
    fn keys(&self) -> Vec<String>;
    fn remove(&self, key: &str);
}

/// In-memory [`SessionStore`], the default outside a browser and the one
/// tests drive.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self.entries.lock().expect("session store poisoned");
        entries.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().expect("session store poisoned");
        entries.contains_key(key)
    }
}

impl SessionStore for MemorySessionStore {
    fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("session store poisoned");
        entries.keys().cloned().collect()
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("session store poisoned");
        entries.remove(key);
    }
}

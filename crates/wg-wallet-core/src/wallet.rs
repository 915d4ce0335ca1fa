//! The public wallet facade: identity metadata, connection lifecycle,
//! signing, contract read/write, and the transfer entry points.

use crate::classify::Classifier;
use crate::connect;
use crate::error::WalletError;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};
use wg_api_types::{AppMetadata, ChainId, Support, ThemeMode, TxHash, WalletAddress};
use wg_networks::{NetworkDescriptor, NetworkInput, Registry, units};
use wg_transport::{
    ContractCall, ModalUi, RpcClient, SessionStore, TransportError, WalletTransport,
};

/// Session-store keys left behind by prior wallet-session protocols.
const STALE_KEY_PREFIXES: [&str; 4] = ["wc@2", "wagmi", "W3M", "--walletlink"];
const STALE_KEYS: [&str; 2] = ["walletconnect", "WALLETCONNECT_DEEPLINK_CHOICE"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub project_id: String,
    pub metadata: AppMetadata,
    #[serde(default)]
    pub theme_mode: ThemeMode,
    /// The application's required network. `None` enables multi-chain
    /// mode where every supported network is a candidate.
    #[serde(default)]
    pub network: Option<NetworkInput>,
}

type ConnectOutcome = Result<WalletAddress, WalletError>;
type PendingSlot = std::sync::Mutex<Option<broadcast::Sender<ConnectOutcome>>>;

/// Clears the outstanding-attempt slot when the leading `connect()` future
/// completes or is dropped mid-attempt. Dropping the slot's sender closes
/// the channel, so followers of an abandoned attempt observe the closure
/// instead of waiting forever.
struct PendingGuard<'a>(&'a PendingSlot);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().expect("pending guard poisoned").take();
    }
}

pub struct Wallet {
    pub(crate) config: WalletConfig,
    pub(crate) registry: Registry,
    pub(crate) transport: Arc<dyn WalletTransport>,
    pub(crate) modal: Arc<dyn ModalUi>,
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) classifier: Classifier,
    pub(crate) session: Mutex<Session>,
    /// One-slot guard for the outstanding connection attempt: concurrent
    /// `connect()` callers subscribe to the same broadcast outcome.
    pending: PendingSlot,
}

impl Wallet {
    /// Builds the facade for an application's network requirement.
    ///
    /// Fails with [`WalletError::NetworkNotFound`] when the requirement
    /// cannot be resolved; the facade must not be used after that.
    pub fn new(
        config: WalletConfig,
        transport: Arc<dyn WalletTransport>,
        modal: Arc<dyn ModalUi>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, WalletError> {
        let registry = Registry::from_input(config.network.as_ref())?;
        let connected_network = if registry.is_multi_chain() {
            None
        } else {
            registry.first().cloned()
        };
        info!(
            project_id = %config.project_id,
            multi_chain = registry.is_multi_chain(),
            "wallet facade constructed"
        );

        Ok(Self {
            config,
            registry,
            transport,
            modal,
            store,
            classifier: Classifier::default(),
            session: Mutex::new(Session {
                connected_account: None,
                connected_network,
            }),
            pending: std::sync::Mutex::new(None),
        })
    }

    /// Replaces the error-classification rule table.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    // ── Identity metadata ────────────────────────────────────────────

    pub fn key(&self) -> &'static str {
        "web3modal"
    }

    pub fn name(&self) -> &'static str {
        "Web3Modal"
    }

    pub fn supports(&self) -> Vec<Support> {
        vec![Support::Browser, Support::Mobile]
    }

    pub fn deep_link(&self) -> Option<&str> {
        None
    }

    pub fn download_link(&self) -> Option<&str> {
        None
    }

    /// Detection is meaningless for a modal-based wallet.
    pub fn is_detected(&self) -> Option<bool> {
        None
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.config.theme_mode
    }

    // ── Clients and raw requests ─────────────────────────────────────

    /// The client bound to the connected wallet, falling back to the
    /// public client when none exists yet.
    pub async fn wallet_client(&self) -> Arc<dyn RpcClient> {
        match self.transport.wallet_client().await {
            Some(client) => client,
            None => self.transport.public_client().await,
        }
    }

    pub async fn public_client(&self) -> Arc<dyn RpcClient> {
        self.transport.public_client().await
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let client = self.wallet_client().await;
        client
            .request(method, params)
            .await
            .map_err(|error| self.classifier.classify(&error))
    }

    // ── Session state ────────────────────────────────────────────────

    pub async fn connected_account(&self) -> Option<WalletAddress> {
        self.session.lock().await.connected_account.clone()
    }

    pub async fn connected_network(&self) -> Option<NetworkDescriptor> {
        self.session.lock().await.connected_network.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.account().is_connected
    }

    /// Clears stale session-store entries from prior wallet-session
    /// protocols, resets the modal, and disconnects the transport.
    pub async fn remove_old_connection(&self) -> Result<(), WalletError> {
        let mut removed = 0usize;
        for key in self.store.keys() {
            let stale = STALE_KEY_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
                || STALE_KEYS.contains(&key.as_str());
            if stale {
                self.store.remove(&key);
                removed += 1;
            }
        }
        debug!(removed, "cleared stale session keys");

        self.modal.reset_account();
        self.modal.reset_network();
        self.modal.reset_wc_connection();

        self.transport
            .disconnect()
            .await
            .map_err(|error| self.classifier.classify(&error))
    }

    // ── Chain identity ───────────────────────────────────────────────

    pub async fn chain_id(&self) -> Result<u64, WalletError> {
        let value = self.request("eth_chainId", json!([])).await?;
        quantity_u64(&value)
    }

    /// Hex chain id with a normalized prefix (`0x01` comes back `0x1`).
    pub async fn chain_hex_id(&self) -> Result<String, WalletError> {
        let id = self.chain_id().await?;
        Ok(format!("{id:#x}"))
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Resolves a connected account on the required network.
    ///
    /// Concurrent calls while an attempt is outstanding attach to the
    /// same resolution instead of opening a second selection UI. After
    /// the lower-level [`Wallet::connection`] primitive resolves, the
    /// live chain is re-checked; a mismatch at that point overrides the
    /// inner success with `not-accepted-chain`. The chain can move
    /// between primitive resolution and this check, so the override is
    /// load-bearing, not dead code.
    pub async fn connect(&self) -> Result<WalletAddress, WalletError> {
        enum Attempt {
            Lead(broadcast::Sender<ConnectOutcome>),
            Follow(broadcast::Receiver<ConnectOutcome>),
        }

        let attempt = {
            let mut pending = self.pending.lock().expect("pending guard poisoned");
            match pending.as_ref() {
                Some(sender) => Attempt::Follow(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    *pending = Some(sender.clone());
                    Attempt::Lead(sender)
                }
            }
        };

        let sender = match attempt {
            Attempt::Follow(mut receiver) => {
                return match receiver.recv().await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(WalletError::Transport(TransportError::new(
                        "outstanding connection attempt was dropped",
                    ))),
                };
            }
            Attempt::Lead(sender) => sender,
        };
        let _clear = PendingGuard(&self.pending);

        let outcome = self.connection().await;
        let outcome = match outcome {
            Ok(address) => {
                let live = self.modal.selected_network_id();
                let target = {
                    let session = self.session.lock().await;
                    session.connected_network.as_ref().map(|network| network.id)
                };
                match target {
                    Some(target) if live != Some(target) => {
                        debug!(?live, target, "chain moved after resolution");
                        Err(WalletError::NotAcceptedChain)
                    }
                    _ => Ok(address),
                }
            }
            Err(error) => Err(error),
        };

        // No receivers is fine; send only fans out to followers.
        let _ = sender.send(outcome.clone());
        outcome
    }

    /// The lower-level connection primitive: drives the state machine
    /// through selection, account watch, and network reconciliation, then
    /// commits the session.
    pub async fn connection(&self) -> Result<WalletAddress, WalletError> {
        let target = {
            let session = self.session.lock().await;
            session.connected_network.clone()
        };

        let (address, live_chain) = connect::drive(
            self.transport.as_ref(),
            self.modal.as_ref(),
            target.as_ref().map(|network| ChainId(network.id)),
            &self.classifier,
        )
        .await?;

        let mut session = self.session.lock().await;
        session.connected_account = Some(address.clone());
        match live_chain.and_then(|id| self.registry.by_id(id)) {
            Some(network) => session.connected_network = Some(network.clone()),
            None => {
                if let Some(target) = target {
                    session.connected_network = Some(target);
                }
            }
        }
        info!(address = %address.0, "wallet connected");
        Ok(address)
    }

    pub async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError> {
        self.transport
            .switch_network(ChainId(chain_id))
            .await
            .map_err(|error| self.classifier.classify(&error))
    }

    /// Repoints the current network without rebuilding the transport
    /// configuration.
    pub async fn set_connected_network(&self, chain_id: u64) -> Result<(), WalletError> {
        let network = self
            .registry
            .by_id(chain_id)
            .cloned()
            .ok_or(WalletError::NetworkNotFound)?;
        self.session.lock().await.connected_network = Some(network);
        Ok(())
    }

    // ── Signing and raw transactions ─────────────────────────────────

    pub async fn personal_sign(&self, message: &str) -> Result<String, WalletError> {
        let account = {
            let session = self.session.lock().await;
            session.require_account()?.clone()
        };
        let value = self
            .request("personal_sign", json!([message, account.0]))
            .await?;
        expect_string(value, "personal_sign")
    }

    pub async fn send_transaction(&self, params: Value) -> Result<TxHash, WalletError> {
        let value = self.request("eth_sendTransaction", params).await?;
        expect_string(value, "eth_sendTransaction").map(TxHash)
    }

    pub async fn estimate_gas(&self, params: Value) -> Result<String, WalletError> {
        let value = self.request("eth_estimateGas", json!([params])).await?;
        expect_string(value, "eth_estimateGas")
    }

    // ── Contract access ──────────────────────────────────────────────

    pub async fn write_contract(&self, call: &ContractCall) -> Result<TxHash, WalletError> {
        self.transport
            .write_contract(call)
            .await
            .map_err(|error| self.classifier.classify(&error))
    }

    pub async fn read_contract(
        &self,
        address: &str,
        function_name: &str,
        abi: Value,
        args: Vec<Value>,
    ) -> Result<Value, WalletError> {
        let call = ContractCall {
            address: address.to_owned(),
            function_name: function_name.to_owned(),
            abi,
            args,
        };
        self.transport
            .read_contract(&call)
            .await
            .map_err(|error| self.classifier.classify(&error))
    }
}

pub(crate) fn quantity_u64(value: &Value) -> Result<u64, WalletError> {
    let quantity = quantity_u128(value)?;
    u64::try_from(quantity).map_err(|_| {
        WalletError::Transport(TransportError::new(format!("bad quantity: {quantity}")))
    })
}

pub(crate) fn quantity_u128(value: &Value) -> Result<u128, WalletError> {
    match value {
        Value::String(text) => units::from_quantity(text).map_err(|_| {
            WalletError::Transport(TransportError::new(format!("bad quantity: {text}")))
        }),
        Value::Number(number) => number.as_u64().map(u128::from).ok_or_else(|| {
            WalletError::Transport(TransportError::new(format!("bad quantity: {number}")))
        }),
        other => Err(WalletError::Transport(TransportError::new(format!(
            "bad quantity: {other}"
        )))),
    }
}

fn expect_string(value: Value, method: &str) -> Result<String, WalletError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(WalletError::Transport(TransportError::new(format!(
            "{method} returned a non-string value: {other}"
        )))),
    }
}

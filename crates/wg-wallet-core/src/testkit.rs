//! Scripted fakes for the collaborator seams, shared by the crate's tests.

use crate::wallet::{Wallet, WalletConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use wg_api_types::{AppMetadata, ChainId, ThemeMode, TxHash};
use wg_networks::NetworkInput;
use wg_transport::{
    AccountStatus, ContractCall, MemorySessionStore, ModalEvent, ModalUi, RpcClient,
    TokenMetadata, TransportError, WalletTransport,
};

pub(crate) struct Fixture {
    pub wallet: Arc<Wallet>,
    pub transport: Arc<MockTransport>,
    pub modal: Arc<MockModal>,
    pub store: Arc<MemorySessionStore>,
}

/// Wallet wired to fresh mocks, required network as given.
pub(crate) fn fixture(network: Option<NetworkInput>) -> Fixture {
    let transport = Arc::new(MockTransport::default());
    let modal = Arc::new(MockModal::default());
    let store = Arc::new(MemorySessionStore::default());
    let config = WalletConfig {
        project_id: "test-project".to_owned(),
        metadata: AppMetadata {
            name: "Demo dApp".to_owned(),
            description: "fixture".to_owned(),
            url: "https://dapp.example".to_owned(),
            icons: Vec::new(),
        },
        theme_mode: ThemeMode::default(),
        network,
    };
    let wallet = Wallet::new(config, transport.clone(), modal.clone(), store.clone())
        .expect("fixture wallet should construct");
    Fixture {
        wallet: Arc::new(wallet),
        transport,
        modal,
        store,
    }
}

/// Fixture already connected on the given chain, session committed.
pub(crate) async fn connected_fixture(chain_id: u64, address: &str) -> Fixture {
    let fx = fixture(Some(NetworkInput::Id(chain_id)));
    fx.transport.set_account(AccountStatus::connected(address));
    fx.modal.select_network(Some(chain_id));
    fx.wallet.connect().await.expect("fixture connect");
    fx
}

/// Records every request and answers from a per-method script.
#[derive(Default)]
pub(crate) struct MockRpc {
    pub responses: Mutex<HashMap<String, Result<Value, TransportError>>>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl MockRpc {
    pub fn respond(&self, method: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_owned(), Ok(value));
    }

    pub fn fail(&self, method: &str, error: TransportError) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_owned(), Err(error));
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

#[async_trait]
impl RpcClient for MockRpc {
    async fn request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_owned(), params));
        match self.responses.lock().unwrap().get(method) {
            Some(result) => result.clone(),
            None => Err(TransportError::new(format!("no scripted response for {method}"))),
        }
    }
}

pub(crate) struct MockTransport {
    pub current_account: Mutex<AccountStatus>,
    account_tx: Mutex<Option<mpsc::UnboundedSender<AccountStatus>>>,
    pub rpc: Arc<MockRpc>,
    pub switch_calls: Mutex<Vec<ChainId>>,
    pub switch_result: Mutex<Result<(), TransportError>>,
    pub on_switch: Mutex<Option<Box<dyn Fn(ChainId) + Send + Sync>>>,
    pub tokens: Mutex<HashMap<String, TokenMetadata>>,
    pub reads: Mutex<HashMap<String, Value>>,
    pub read_calls: Mutex<Vec<ContractCall>>,
    pub writes: Mutex<Vec<ContractCall>>,
    pub write_result: Mutex<Result<TxHash, TransportError>>,
    pub disconnects: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            current_account: Mutex::new(AccountStatus::disconnected()),
            account_tx: Mutex::new(None),
            rpc: Arc::new(MockRpc::default()),
            switch_calls: Mutex::new(Vec::new()),
            switch_result: Mutex::new(Ok(())),
            on_switch: Mutex::new(None),
            tokens: Mutex::new(HashMap::new()),
            reads: Mutex::new(HashMap::new()),
            read_calls: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            write_result: Mutex::new(Ok(TxHash("0xwritehash".to_owned()))),
            disconnects: AtomicUsize::new(0),
        }
    }
}

impl MockTransport {
    pub fn set_account(&self, status: AccountStatus) {
        *self.current_account.lock().unwrap() = status;
    }

    /// Pushes an account-change notification to the active watcher.
    pub fn emit_account(&self, status: AccountStatus) {
        self.set_account(status.clone());
        if let Some(tx) = self.account_tx.lock().unwrap().as_ref() {
            let _ = tx.send(status);
        }
    }

    /// Waits until a connection attempt has registered its account watch.
    pub async fn watched(&self) {
        while self.account_tx.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }
    }

    pub fn token(&self, address: &str, decimals: u8) {
        self.tokens.lock().unwrap().insert(
            address.to_owned(),
            TokenMetadata {
                address: address.to_owned(),
                symbol: Some("TOK".to_owned()),
                decimals,
            },
        );
    }

    pub fn read_result(&self, function_name: &str, value: Value) {
        self.reads
            .lock()
            .unwrap()
            .insert(function_name.to_owned(), value);
    }
}

#[async_trait]
impl WalletTransport for MockTransport {
    fn account(&self) -> AccountStatus {
        self.current_account.lock().unwrap().clone()
    }

    fn watch_account(&self) -> mpsc::UnboundedReceiver<AccountStatus> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.account_tx.lock().unwrap() = Some(tx);
        rx
    }

    async fn switch_network(&self, chain_id: ChainId) -> Result<(), TransportError> {
        self.switch_calls.lock().unwrap().push(chain_id);
        if let Some(hook) = self.on_switch.lock().unwrap().as_ref() {
            hook(chain_id);
        }
        self.switch_result.lock().unwrap().clone()
    }

    async fn wallet_client(&self) -> Option<Arc<dyn RpcClient>> {
        Some(self.rpc.clone())
    }

    async fn public_client(&self) -> Arc<dyn RpcClient> {
        self.rpc.clone()
    }

    async fn read_contract(
        &self,
        call: &ContractCall,
    ) -> Result<Value, TransportError> {
        self.read_calls.lock().unwrap().push(call.clone());
        match self.reads.lock().unwrap().get(&call.function_name) {
            Some(value) => Ok(value.clone()),
            None => Err(TransportError::new(format!(
                "no scripted read for {}",
                call.function_name
            ))),
        }
    }

    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash, TransportError> {
        self.writes.lock().unwrap().push(call.clone());
        self.write_result.lock().unwrap().clone()
    }

    async fn fetch_token(&self, address: &str) -> Result<TokenMetadata, TransportError> {
        self.tokens
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("unknown token {address}")))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockModal {
    selected: Mutex<Option<u64>>,
    pub opens: AtomicUsize,
    events_tx: Mutex<Option<mpsc::UnboundedSender<ModalEvent>>>,
    pub resets: AtomicUsize,
}

impl MockModal {
    pub fn select_network(&self, id: Option<u64>) {
        *self.selected.lock().unwrap() = id;
    }

    pub fn emit(&self, event: ModalEvent) {
        if let Some(tx) = self.events_tx.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Waits until a connection attempt has subscribed to modal events.
    pub async fn subscribed(&self) {
        while self.events_tx.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ModalUi for MockModal {
    fn open(&self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<ModalEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events_tx.lock().unwrap() = Some(tx);
        rx
    }

    fn selected_network_id(&self) -> Option<u64> {
        *self.selected.lock().unwrap()
    }

    fn reset_account(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn reset_network(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn reset_wc_connection(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

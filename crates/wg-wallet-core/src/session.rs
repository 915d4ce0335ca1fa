use crate::error::WalletError;
use wg_api_types::WalletAddress;
use wg_networks::NetworkDescriptor;
use wg_transport::TransportError;

/// The mutable record of the currently connected account and network.
///
/// Owned by the facade; written only by the connection state machine and
/// read by the transfer pipeline and signing operations.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub connected_account: Option<WalletAddress>,
    pub connected_network: Option<NetworkDescriptor>,
}

impl Session {
    pub fn require_account(&self) -> Result<&WalletAddress, WalletError> {
        self.connected_account.as_ref().ok_or_else(|| {
            WalletError::Transport(TransportError::new("wallet is not connected"))
        })
    }

    pub fn require_network(&self) -> Result<&NetworkDescriptor, WalletError> {
        self.connected_network
            .as_ref()
            .ok_or(WalletError::NetworkNotFound)
    }
}

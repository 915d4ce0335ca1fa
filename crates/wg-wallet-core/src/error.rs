use thiserror::Error;
use wg_networks::NetworkError;
use wg_transport::TransportError;

/// Semantic failure kinds surfaced to application code. Every collaborator
/// error is classified into one of these at the point of catching; only
/// unmatched errors pass through raw.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("request-rejected")]
    RequestRejected,
    #[error("not-accepted-chain")]
    NotAcceptedChain,
    #[error("already-processing")]
    AlreadyProcessing,
    #[error("invalid-rpc-error")]
    InvalidRpcError,
    #[error("invalid-contract-address")]
    InvalidContractAddress,
    #[error("contract-function-error")]
    ContractFunctionError,
    #[error("insufficient-balance")]
    InsufficientBalance,
    #[error("transfer-amount-error")]
    TransferAmountError,
    #[error("closed-web3modal")]
    ClosedWeb3Modal,
    #[error("switch-chain-rejected")]
    SwitchChainRejected,
    #[error("network-not-found")]
    NetworkNotFound,
    /// Unclassified collaborator failure, passed through unchanged.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<NetworkError> for WalletError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::NotFound => WalletError::NetworkNotFound,
        }
    }
}

//! Wallet-connection adapter core: the connection state machine, the
//! transfer-validation pipeline, and the facade composing them over the
//! injected collaborator seams from `wg-transport`.

mod classify;
mod connect;
mod error;
mod session;
mod transfer;
mod wallet;

#[cfg(test)]
mod testkit;

pub use classify::{Classifier, Matcher};
pub use error::WalletError;
pub use session::Session;
pub use wallet::{Wallet, WalletConfig};

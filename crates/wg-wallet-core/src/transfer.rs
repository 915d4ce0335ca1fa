//! The transfer-validation pipeline.
//!
//! Both paths enforce the same precondition order before any dispatch:
//! live network must match the session's network, then the fetched
//! balance must cover the amount, then the amount must be non-negative.
//! The first failing check short-circuits.

use crate::error::WalletError;
use crate::session::Session;
use crate::wallet::{Wallet, quantity_u128};
use serde_json::{Value, json};
use tracing::warn;
use wg_api_types::{TransferRequest, TxHash, WalletAddress};
use wg_transport::ContractCall;

/// ERC20 `transfer(address,uint256)` ABI fragment.
fn erc20_transfer_abi() -> Value {
    json!([{
        "constant": false,
        "inputs": [
            {"name": "_to", "type": "address"},
            {"name": "_value", "type": "uint256"}
        ],
        "name": "transfer",
        "outputs": [{"name": "success", "type": "bool"}],
        "stateMutability": "nonpayable",
        "type": "function"
    }])
}

/// ERC20 `balanceOf(address)` ABI fragment.
fn erc20_balance_of_abi() -> Value {
    json!([{
        "constant": true,
        "inputs": [{"name": "_owner", "type": "address"}],
        "name": "balanceOf",
        "outputs": [{"name": "balance", "type": "uint256"}],
        "payable": false,
        "stateMutability": "view",
        "type": "function"
    }])
}

impl Wallet {
    /// Routes to the native path when no token address is given, else the
    /// token path.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TxHash, WalletError> {
        match &request.token_address {
            Some(token_address) => {
                self.token_transfer(&request.to, &request.amount, token_address)
                    .await
            }
            None => self.coin_transfer(&request.to, &request.amount).await,
        }
    }

    /// Native-coin transfer: validates, estimates gas, then submits a raw
    /// value transfer.
    pub async fn coin_transfer(&self, to: &str, amount: &str) -> Result<TxHash, WalletError> {
        let (account, network) = self.transfer_context().await?;
        self.require_live_network(network.id)?;

        let decimals = network.native_currency.decimals;
        let balance_value = self
            .request("eth_getBalance", json!([account.0, "latest"]))
            .await?;
        let balance = quantity_u128(&balance_value)?;

        check_amount(amount, balance, decimals)?;

        let value = wg_networks::units::to_fixed_point_hex(amount, decimals)
            .map_err(|_| WalletError::TransferAmountError)?;
        let mut tx = json!({
            "from": account.0,
            "to": to,
            "value": value,
            "data": "0x",
        });
        let gas = self.estimate_gas(tx.clone()).await?;
        tx["gas"] = json!(gas);

        self.send_transaction(json!([tx])).await
    }

    /// Token transfer via the contract's `transfer(address,uint256)`.
    pub async fn token_transfer(
        &self,
        to: &str,
        amount: &str,
        token_address: &str,
    ) -> Result<TxHash, WalletError> {
        let (account, network) = self.transfer_context().await?;
        self.require_live_network(network.id)?;

        let token = self
            .transport
            .fetch_token(token_address)
            .await
            .map_err(|error| self.classifier.classify(&error))?;

        let balance_value = self
            .read_contract(
                token_address,
                "balanceOf",
                erc20_balance_of_abi(),
                vec![json!(account.0)],
            )
            .await?;
        let balance = quantity_u128(&balance_value)?;

        check_amount(amount, balance, token.decimals)?;

        let value = wg_networks::units::to_fixed_point_hex(amount, token.decimals)
            .map_err(|_| WalletError::TransferAmountError)?;
        let call = ContractCall {
            address: token_address.to_owned(),
            function_name: "transfer".to_owned(),
            abi: erc20_transfer_abi(),
            args: vec![json!(to), json!(value)],
        };
        self.write_contract(&call).await
    }

    async fn transfer_context(
        &self,
    ) -> Result<(WalletAddress, wg_networks::NetworkDescriptor), WalletError> {
        let session: Session = self.session.lock().await.clone();
        let account = session.require_account()?.clone();
        let network = session.require_network()?.clone();
        Ok((account, network))
    }

    /// Precondition 1: the wallet's live selected chain must equal the
    /// session's current network. Checked before any balance lookup.
    fn require_live_network(&self, network_id: u64) -> Result<(), WalletError> {
        let live = self.modal.selected_network_id();
        if live != Some(network_id) {
            warn!(?live, network_id, "transfer refused on mismatched chain");
            return Err(WalletError::NotAcceptedChain);
        }
        Ok(())
    }
}

/// Preconditions 2–4: the amount, parsed as a float, must not exceed the
/// balance converted to decimal, and must be non-negative.
fn check_amount(amount: &str, balance: u128, decimals: u8) -> Result<(), WalletError> {
    let requested: f64 = amount
        .trim()
        .parse()
        .map_err(|_| WalletError::TransferAmountError)?;
    if !requested.is_finite() {
        return Err(WalletError::TransferAmountError);
    }
    if requested > wg_networks::units::to_decimal(balance, decimals) {
        return Err(WalletError::InsufficientBalance);
    }
    if requested < 0.0 {
        return Err(WalletError::TransferAmountError);
    }
    Ok(())
}

//! Maps raw collaborator failures to semantic [`WalletError`] kinds.
//!
//! Wallet stacks disagree on how user cancellation, chain-switch refusal,
//! and RPC failures look on the wire, and the exact strings drift between
//! releases. The mapping is therefore an ordered rule table, first match
//! wins, extensible without touching control flow.

use crate::error::WalletError;
use wg_transport::TransportError;

/// Predicate half of a classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Exact match on the error's symbolic name.
    Name(String),
    /// Substring match on the error's message.
    MessageContains(String),
}

impl Matcher {
    pub fn name(value: impl Into<String>) -> Self {
        Matcher::Name(value.into())
    }

    pub fn message(value: impl Into<String>) -> Self {
        Matcher::MessageContains(value.into())
    }

    fn matches(&self, error: &TransportError) -> bool {
        match self {
            Matcher::Name(name) => error.name.as_deref() == Some(name.as_str()),
            Matcher::MessageContains(needle) => error.message.contains(needle.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    matcher: Matcher,
    kind: WalletError,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    /// The fullest rule set observed across wallet stacks in the wild.
    fn default() -> Self {
        let rules = [
            (
                Matcher::name("ContractFunctionExecutionError"),
                WalletError::ContractFunctionError,
            ),
            (
                Matcher::name("UserRejectedRequestError"),
                WalletError::RequestRejected,
            ),
            (Matcher::message("cancel"), WalletError::RequestRejected),
            (Matcher::message("reject"), WalletError::RequestRejected),
            (
                Matcher::message("User disapproved requested chains"),
                WalletError::RequestRejected,
            ),
            (
                Matcher::message(
                    "MetaMask Personal Message Signature: User denied message signature",
                ),
                WalletError::RequestRejected,
            ),
            (
                Matcher::name("SwitchChainError"),
                WalletError::NotAcceptedChain,
            ),
            (
                Matcher::message("Already processing eth_requestAccounts"),
                WalletError::AlreadyProcessing,
            ),
            (
                Matcher::message("An unknown RPC error occurred"),
                WalletError::InvalidRpcError,
            ),
            (
                Matcher::message("The contract function"),
                WalletError::InvalidContractAddress,
            ),
        ];

        Self {
            rules: rules
                .into_iter()
                .map(|(matcher, kind)| Rule { matcher, kind })
                .collect(),
        }
    }
}

impl Classifier {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule; earlier rules still win.
    pub fn with_rule(mut self, matcher: Matcher, kind: WalletError) -> Self {
        self.rules.push(Rule { matcher, kind });
        self
    }

    /// Pure ordered cascade; unmatched errors pass through unchanged.
    pub fn classify(&self, error: &TransportError) -> WalletError {
        for rule in &self.rules {
            if rule.matcher.matches(error) {
                return rule.kind.clone();
            }
        }
        WalletError::Transport(error.clone())
    }
}

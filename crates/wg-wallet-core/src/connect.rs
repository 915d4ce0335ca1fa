//! The connection state machine.
//!
//! Modeled as an explicit FSM with a single [`ConnectMachine::handle_event`]
//! entry point so the "one outstanding attempt" and "never double-resolve"
//! invariants are enforceable without the modal collaborator in the loop.
//! [`drive`] owns the per-attempt subscriptions and feeds the machine.

use crate::classify::Classifier;
use crate::error::WalletError;
use std::collections::VecDeque;
use tracing::debug;
use wg_api_types::{ChainId, WalletAddress};
use wg_transport::{AccountStatus, ModalEvent, ModalUi, TransportError, WalletTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectState {
    Idle,
    AwaitingSelection,
    AwaitingSwitch,
    Connected,
    Rejected,
}

#[derive(Debug, Clone)]
pub(crate) enum ConnectEvent {
    WalletSelected,
    ModalClosed { live_chain: Option<u64> },
    ConnectFailed(TransportError),
    AccountChanged {
        status: AccountStatus,
        live_chain: Option<u64>,
    },
    SwitchResolved {
        address: WalletAddress,
        result: Result<(), TransportError>,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum Transition {
    Continue,
    RequestSwitch {
        target: ChainId,
        address: WalletAddress,
    },
    Resolve {
        address: WalletAddress,
        live_chain: Option<u64>,
    },
    Fail(WalletError),
}

pub(crate) struct ConnectMachine {
    /// Required chain, or `None` in multi-chain mode where any live chain
    /// is accepted.
    target: Option<ChainId>,
    state: ConnectState,
    wallet_selected: bool,
    switch_in_flight: bool,
}

impl ConnectMachine {
    pub(crate) fn new(target: Option<ChainId>) -> Self {
        Self {
            target,
            state: ConnectState::Idle,
            wallet_selected: false,
            switch_in_flight: false,
        }
    }

    pub(crate) fn start(&mut self) {
        self.state = ConnectState::AwaitingSelection;
    }

    fn chain_matches(&self, live_chain: Option<u64>) -> bool {
        match self.target {
            None => true,
            Some(target) => live_chain == Some(target.0),
        }
    }

    pub(crate) fn handle_event(
        &mut self,
        event: ConnectEvent,
        classifier: &Classifier,
    ) -> Transition {
        if matches!(self.state, ConnectState::Connected | ConnectState::Rejected) {
            // Settled outcomes are never re-resolved by stale events.
            return Transition::Continue;
        }

        match event {
            ConnectEvent::WalletSelected => {
                self.wallet_selected = true;
                Transition::Continue
            }
            ConnectEvent::ConnectFailed(error) => {
                self.state = ConnectState::Rejected;
                Transition::Fail(classifier.classify(&error))
            }
            ConnectEvent::ModalClosed { live_chain } => {
                if self.switch_in_flight {
                    // The switch outcome decides this attempt.
                    return Transition::Continue;
                }
                if !self.wallet_selected {
                    self.state = ConnectState::Rejected;
                    return Transition::Fail(WalletError::ClosedWeb3Modal);
                }
                if self.chain_matches(live_chain) {
                    // A wallet was clicked and the chain already matches:
                    // the account watch will resolve this attempt.
                    Transition::Continue
                } else {
                    self.state = ConnectState::Rejected;
                    Transition::Fail(WalletError::NotAcceptedChain)
                }
            }
            ConnectEvent::AccountChanged { status, live_chain } => {
                if !status.is_connected {
                    return Transition::Continue;
                }
                let Some(address) = status.address else {
                    return Transition::Continue;
                };
                if self.chain_matches(live_chain) {
                    self.state = ConnectState::Connected;
                    return Transition::Resolve {
                        address,
                        live_chain,
                    };
                }
                if self.switch_in_flight {
                    // One switch request per attempt; further account
                    // events during the switch are swallowed.
                    return Transition::Continue;
                }
                let Some(target) = self.target else {
                    return Transition::Continue;
                };
                self.switch_in_flight = true;
                self.state = ConnectState::AwaitingSwitch;
                Transition::RequestSwitch { target, address }
            }
            ConnectEvent::SwitchResolved { address, result } => {
                self.switch_in_flight = false;
                match result {
                    Ok(()) => {
                        self.state = ConnectState::Connected;
                        let live_chain = self.target.map(|target| target.0);
                        Transition::Resolve {
                            address,
                            live_chain,
                        }
                    }
                    Err(_) => {
                        self.state = ConnectState::Rejected;
                        Transition::Fail(WalletError::SwitchChainRejected)
                    }
                }
            }
        }
    }
}

/// Runs one connection attempt to completion and returns the connected
/// address with the chain it landed on.
///
/// Exactly one modal-event subscription and one account-watch subscription
/// exist for the duration; both are dropped on return, so a settled attempt
/// cannot be re-resolved by a stale listener.
pub(crate) async fn drive(
    transport: &dyn WalletTransport,
    modal: &dyn ModalUi,
    target: Option<ChainId>,
    classifier: &Classifier,
) -> Result<(WalletAddress, Option<u64>), WalletError> {
    let mut machine = ConnectMachine::new(target);
    machine.start();

    let mut modal_events = modal.subscribe_events();
    let mut accounts = transport.watch_account();

    let mut seeded = VecDeque::new();
    let current = transport.account();
    if current.is_connected {
        // Already connected: skip the selection UI and go straight to
        // network reconciliation with the current account.
        debug!(target_chain = ?target, "wallet already connected, reconciling network");
        seeded.push_back(ConnectEvent::AccountChanged {
            status: current,
            live_chain: modal.selected_network_id(),
        });
    } else {
        modal.open();
    }

    loop {
        let event = match seeded.pop_front() {
            Some(event) => event,
            None => tokio::select! {
                Some(event) = modal_events.recv() => match event {
                    ModalEvent::SelectWallet => ConnectEvent::WalletSelected,
                    ModalEvent::ModalClose => ConnectEvent::ModalClosed {
                        live_chain: modal.selected_network_id(),
                    },
                    ModalEvent::ConnectError(error) => ConnectEvent::ConnectFailed(error),
                },
                Some(status) = accounts.recv() => ConnectEvent::AccountChanged {
                    live_chain: modal.selected_network_id(),
                    status,
                },
                else => {
                    return Err(WalletError::Transport(TransportError::new(
                        "connection event sources closed before resolution",
                    )));
                }
            },
        };

        match machine.handle_event(event, classifier) {
            Transition::Continue => {}
            Transition::RequestSwitch { target, address } => {
                debug!(chain_id = target.0, "requesting network switch");
                let result = transport.switch_network(target).await;
                seeded.push_back(ConnectEvent::SwitchResolved { address, result });
            }
            Transition::Resolve { address, live_chain } => {
                debug!(address = %address.0, ?live_chain, "connection resolved");
                return Ok((address, live_chain));
            }
            Transition::Fail(error) => {
                debug!(%error, "connection rejected");
                return Err(error);
            }
        }
    }
}

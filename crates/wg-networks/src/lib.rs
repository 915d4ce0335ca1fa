use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod units;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("network-not-found")]
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub symbol: String,
    pub decimals: u8,
}

/// Canonical description of a chain the wallet can operate on.
///
/// Immutable once resolved; the facade only reassigns which descriptor
/// is "current".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// Caller-supplied descriptor for a chain outside the supported list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomNetwork {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// What an application may hand us to identify its required network:
/// a numeric chain id, a symbolic name, or a full custom descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NetworkInput {
    Id(u64),
    Name(String),
    Custom(CustomNetwork),
}

/// The chains shipped with the registry. Applications can still bring
/// their own via [`NetworkInput::Custom`].
pub fn supported_networks() -> Vec<NetworkDescriptor> {
    fn entry(
        id: u64,
        name: &str,
        symbol: &str,
        rpc_url: &str,
        explorer_url: &str,
    ) -> NetworkDescriptor {
        NetworkDescriptor {
            id,
            name: name.to_owned(),
            native_currency: NativeCurrency {
                symbol: symbol.to_owned(),
                decimals: 18,
            },
            rpc_url: rpc_url.to_owned(),
            ws_url: None,
            explorer_url: Some(explorer_url.to_owned()),
        }
    }

    vec![
        entry(
            1,
            "Ethereum",
            "ETH",
            "https://cloudflare-eth.com",
            "https://etherscan.io",
        ),
        entry(
            10,
            "Optimism",
            "ETH",
            "https://mainnet.optimism.io",
            "https://optimistic.etherscan.io",
        ),
        entry(
            56,
            "BNB Smart Chain",
            "BNB",
            "https://bsc-dataseed.binance.org",
            "https://bscscan.com",
        ),
        entry(
            137,
            "Polygon",
            "MATIC",
            "https://polygon-rpc.com",
            "https://polygonscan.com",
        ),
        entry(
            42161,
            "Arbitrum One",
            "ETH",
            "https://arb1.arbitrum.io/rpc",
            "https://arbiscan.io",
        ),
        entry(
            43114,
            "Avalanche",
            "AVAX",
            "https://api.avax.network/ext/bc/C/rpc",
            "https://snowtrace.io",
        ),
        entry(
            11155111,
            "Sepolia",
            "ETH",
            "https://rpc.sepolia.org",
            "https://sepolia.etherscan.io",
        ),
    ]
}

/// Resolves network inputs against the supported list and owns the set of
/// descriptors the wallet may treat as "current".
#[derive(Debug, Clone)]
pub struct Registry {
    networks: Vec<NetworkDescriptor>,
}

impl Registry {
    /// Builds the registry for an application's network requirement.
    ///
    /// `None` means multi-chain mode: every supported network is a
    /// candidate. A supplied input must resolve or construction fails
    /// with [`NetworkError::NotFound`].
    pub fn from_input(input: Option<&NetworkInput>) -> Result<Self, NetworkError> {
        match input {
            None => Ok(Self {
                networks: supported_networks(),
            }),
            Some(input) => {
                let descriptor = resolve_against(&supported_networks(), input)?;
                Ok(Self {
                    networks: vec![descriptor],
                })
            }
        }
    }

    /// Resolves an input against this registry's candidate set. A custom
    /// descriptor with no match comes back normalized.
    pub fn resolve(&self, input: &NetworkInput) -> Result<NetworkDescriptor, NetworkError> {
        resolve_against(&self.networks, input)
    }

    pub fn by_id(&self, id: u64) -> Option<&NetworkDescriptor> {
        self.networks.iter().find(|network| network.id == id)
    }

    pub fn first(&self) -> Option<&NetworkDescriptor> {
        self.networks.first()
    }

    pub fn networks(&self) -> &[NetworkDescriptor] {
        &self.networks
    }

    pub fn is_multi_chain(&self) -> bool {
        self.networks.len() > 1
    }

    /// Shapes a caller-supplied descriptor into the registry's canonical
    /// form: RPC transport config from `rpc_url`/`ws_url`, currency
    /// metadata from the native currency, explorer metadata from
    /// `name`/`explorer_url`.
    pub fn normalize(custom: &CustomNetwork) -> NetworkDescriptor {
        NetworkDescriptor {
            id: custom.id,
            name: custom.name.clone(),
            native_currency: custom.native_currency.clone(),
            rpc_url: custom.rpc_url.clone(),
            ws_url: custom.ws_url.clone(),
            explorer_url: custom.explorer_url.clone(),
        }
    }
}

fn resolve_against(
    networks: &[NetworkDescriptor],
    input: &NetworkInput,
) -> Result<NetworkDescriptor, NetworkError> {
    match input {
        NetworkInput::Id(id) => networks
            .iter()
            .find(|network| network.id == *id)
            .cloned()
            .ok_or(NetworkError::NotFound),
        NetworkInput::Name(name) => {
            // Numeric-looking strings are chain ids, not names.
            if let Ok(id) = name.trim().parse::<u64>() {
                return resolve_against(networks, &NetworkInput::Id(id));
            }
            networks
                .iter()
                .find(|network| network.name.eq_ignore_ascii_case(name.trim()))
                .cloned()
                .ok_or(NetworkError::NotFound)
        }
        NetworkInput::Custom(custom) => {
            if let Some(known) = networks.iter().find(|network| network.id == custom.id) {
                return Ok(known.clone());
            }
            Ok(Registry::normalize(custom))
        }
    }
}

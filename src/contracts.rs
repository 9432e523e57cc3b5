//! Contract manifest loading and binding.
//!
//! The manifest maps logical names to `{address, abi}`. Binding checks every ABI against the
//! compiled schema below by signature, so an ABI drift fails the run instead of silently
//! reading the wrong field later.

use crate::error::{ConfigError, ForkRiskError, RpcError};
use crate::utils::rpc::ChainReader;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolEvent};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

alloy::sol! {
    interface IUniverse {
        function isForking() external view returns (bool forking);
        function getOpenInterestInAttoCash() external view returns (uint256 openInterest);
    }

    interface IAugur {
        event DisputeCrowdsourcerCreated(
            address indexed universe,
            address indexed market,
            address disputeCrowdsourcer,
            uint256[] payoutNumerators,
            uint256 size,
            uint256 disputeRound
        );
    }

    interface IMarket {
        function isFinalized() external view returns (bool finalized);
    }

    interface IERC20Metadata {
        function decimals() external view returns (uint8 value);
    }
}

pub use IAugur::DisputeCrowdsourcerCreated;

pub const UNIVERSE: &str = "Universe";
pub const AUGUR: &str = "Augur";
pub const REPUTATION_TOKEN: &str = "ReputationToken";
pub const CASH: &str = "Cash";

#[derive(Debug, Clone, Copy)]
enum AbiEntry {
    Function(&'static str),
    Event(&'static str),
}

impl AbiEntry {
    fn signature(self) -> &'static str {
        match self {
            Self::Function(sig) | Self::Event(sig) => sig,
        }
    }

    fn declared_in(self, abi: &JsonAbi) -> bool {
        let sig = self.signature();
        let name = sig.split('(').next().unwrap_or(sig);
        match self {
            Self::Function(_) => abi
                .function(name)
                .is_some_and(|fs| fs.iter().any(|f| f.signature() == sig)),
            Self::Event(_) => abi
                .event(name)
                .is_some_and(|es| es.iter().any(|e| e.signature() == sig)),
        }
    }
}

fn required_entries(name: &str) -> Vec<AbiEntry> {
    match name {
        UNIVERSE => vec![AbiEntry::Function(IUniverse::isForkingCall::SIGNATURE)],
        AUGUR => vec![AbiEntry::Event(DisputeCrowdsourcerCreated::SIGNATURE)],
        REPUTATION_TOKEN | CASH => vec![AbiEntry::Function(
            IERC20Metadata::decimalsCall::SIGNATURE,
        )],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub address: Address,
    pub abi: JsonAbi,
}

#[derive(Debug, Clone)]
pub struct ContractManifest {
    entries: BTreeMap<String, ManifestEntry>,
}

#[derive(serde::Deserialize)]
struct RawEntry {
    address: String,
    abi: JsonAbi,
}

impl ContractManifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ManifestUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw).map_err(|err| match err {
            ConfigError::ManifestMalformed { reason, .. } => ConfigError::ManifestMalformed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parses and validates the four required entries; unrelated entries are ignored.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let malformed = |reason: String| ConfigError::ManifestMalformed {
            path: "<inline>".to_string(),
            reason,
        };
        let document: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for name in [UNIVERSE, AUGUR, REPUTATION_TOKEN, CASH] {
            let value = document
                .get(name)
                .ok_or_else(|| ConfigError::MissingContract(name.to_string()))?;
            let entry: RawEntry = serde_json::from_value(value.clone())
                .map_err(|e| malformed(format!("entry `{name}`: {e}")))?;
            let address = Address::from_str(entry.address.trim()).map_err(|_| {
                ConfigError::InvalidAddress {
                    name: name.to_string(),
                    raw: entry.address.clone(),
                }
            })?;
            for required in required_entries(name) {
                if !required.declared_in(&entry.abi) {
                    return Err(ConfigError::AbiMismatch {
                        name: name.to_string(),
                        signature: required.signature().to_string(),
                    });
                }
            }
            entries.insert(
                name.to_string(),
                ManifestEntry {
                    address,
                    abi: entry.abi,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn entry(&self, name: &str) -> Result<&ManifestEntry, ConfigError> {
        self.entries
            .get(name)
            .ok_or_else(|| ConfigError::MissingContract(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundContract {
    pub name: &'static str,
    pub address: Address,
}

#[derive(Debug, Clone, Copy)]
pub struct BoundContracts {
    pub universe: BoundContract,
    pub augur: BoundContract,
    pub reputation_token: BoundContract,
    pub cash: BoundContract,
    /// The Universe ABI declares `getOpenInterestInAttoCash()`.
    pub exposes_open_interest: bool,
}

/// Binds every required contract against the live connection, or none of them.
pub async fn bind<C>(manifest: &ContractManifest, client: &C) -> Result<BoundContracts, ForkRiskError>
where
    C: ChainReader + ?Sized,
{
    let mut bound = Vec::with_capacity(4);
    for name in [UNIVERSE, AUGUR, REPUTATION_TOKEN, CASH] {
        let entry = manifest.entry(name)?;
        let code = client.code_at(entry.address).await?;
        if code.is_empty() {
            return Err(ConfigError::NoCode {
                name: name.to_string(),
                address: format!("{:#x}", entry.address),
            }
            .into());
        }
        tracing::debug!("[BIND] {} -> {:#x} ({} bytes)", name, entry.address, code.len());
        bound.push(BoundContract {
            name,
            address: entry.address,
        });
    }

    let exposes_open_interest = AbiEntry::Function(
        IUniverse::getOpenInterestInAttoCashCall::SIGNATURE,
    )
    .declared_in(&manifest.entry(UNIVERSE)?.abi);

    tracing::info!(
        "[BIND] Bound {} contracts (universe={:#x} augur={:#x})",
        bound.len(),
        bound[0].address,
        bound[1].address
    );
    Ok(BoundContracts {
        universe: bound[0],
        augur: bound[1],
        reputation_token: bound[2],
        cash: bound[3],
        exposes_open_interest,
    })
}

async fn view_call<C, Call>(client: &C, to: Address, call: Call) -> Result<Call::Return, RpcError>
where
    C: ChainReader + ?Sized,
    Call: SolCall,
{
    let input = Bytes::from(call.abi_encode());
    let raw = client.eth_call(to, input).await?;
    Call::abi_decode_returns(raw.as_ref(), true).map_err(|err| RpcError::BadResponse {
        method: Call::SIGNATURE.to_string(),
        reason: err.to_string(),
    })
}

pub async fn is_forking<C>(client: &C, contracts: &BoundContracts) -> Result<bool, RpcError>
where
    C: ChainReader + ?Sized,
{
    let ret = view_call(client, contracts.universe.address, IUniverse::isForkingCall {}).await?;
    Ok(ret.forking)
}

pub async fn open_interest_atto_cash<C>(
    client: &C,
    contracts: &BoundContracts,
) -> Result<U256, RpcError>
where
    C: ChainReader + ?Sized,
{
    let ret = view_call(
        client,
        contracts.universe.address,
        IUniverse::getOpenInterestInAttoCashCall {},
    )
    .await?;
    Ok(ret.openInterest)
}

pub async fn token_decimals<C>(client: &C, token: &BoundContract) -> Result<u8, RpcError>
where
    C: ChainReader + ?Sized,
{
    let ret = view_call(client, token.address, IERC20Metadata::decimalsCall {}).await?;
    Ok(ret.value)
}

pub async fn market_is_finalized<C>(client: &C, market: Address) -> Result<bool, RpcError>
where
    C: ChainReader + ?Sized,
{
    let ret = view_call(client, market, IMarket::isFinalizedCall {}).await?;
    Ok(ret.finalized)
}

//! Values flowing through a deployment: the request, the on-chain receipt and the result.

use std::fmt;

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, B256, U256},
};
use serde::{Deserialize, Serialize};

/// A typed constructor argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ConstructorArg {
    Address(Address),
    Uint256(U256),
    Bool(bool),
    String(String),
}

impl ConstructorArg {
    /// The Solidity type name of this argument.
    pub fn sol_type(&self) -> &'static str {
        match self {
            ConstructorArg::Address(_) => "address",
            ConstructorArg::Uint256(_) => "uint256",
            ConstructorArg::Bool(_) => "bool",
            ConstructorArg::String(_) => "string",
        }
    }

    pub(crate) fn to_sol_value(&self) -> DynSolValue {
        match self {
            ConstructorArg::Address(address) => DynSolValue::Address(*address),
            ConstructorArg::Uint256(value) => DynSolValue::Uint(*value, 256),
            ConstructorArg::Bool(value) => DynSolValue::Bool(*value),
            ConstructorArg::String(value) => DynSolValue::String(value.clone()),
        }
    }
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorArg::Address(address) => write!(f, "{}", address),
            ConstructorArg::Uint256(value) => write!(f, "{}", value),
            ConstructorArg::Bool(value) => write!(f, "{}", value),
            ConstructorArg::String(value) => write!(f, "{:?}", value),
        }
    }
}

/// The network a deployment targets.
///
/// When `chain_id` is set, the driver refuses to broadcast to a node reporting
/// a different chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId {
    pub name: String,
    pub chain_id: Option<u64>,
}

impl NetworkId {
    pub fn new(name: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            name: name.into(),
            chain_id,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chain_id {
            Some(chain_id) => write!(f, "{} (chain {})", self.name, chain_id),
            None => write!(f, "{}", self.name),
        }
    }
}

/// An immutable description of one intended deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    contract: String,
    args: Vec<ConstructorArg>,
    network: NetworkId,
}

impl DeploymentRequest {
    pub fn new(contract: impl Into<String>, args: Vec<ConstructorArg>, network: NetworkId) -> Self {
        Self {
            contract: contract.into(),
            args,
            network,
        }
    }

    /// The artifact key of the contract to deploy.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Constructor arguments, in declaration order.
    pub fn args(&self) -> &[ConstructorArg] {
        &self.args
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }
}

/// What a chain client reports once a transaction has been included in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    /// Address of the created contract, absent for non-creation transactions.
    pub contract_address: Option<Address>,
    /// `false` when the transaction reverted.
    pub status: bool,
}

/// A confirmed deployment.
///
/// Only the driver constructs this, and only from an observed receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    contract: String,
    network: NetworkId,
    address: Address,
    tx_hash: B256,
    block_number: u64,
    attempts: usize,
}

impl DeploymentResult {
    pub(crate) fn confirmed(
        request: &DeploymentRequest,
        address: Address,
        receipt: &DeploymentReceipt,
        attempts: usize,
    ) -> Self {
        Self {
            contract: request.contract.clone(),
            network: request.network.clone(),
            address,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            attempts,
        }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    /// Address of the deployed contract instance.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Block in which the deployment transaction was included.
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Number of receipt polls it took to observe the confirmation.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_display() {
        assert_eq!(NetworkId::new("localhost", None).to_string(), "localhost");
        assert_eq!(
            NetworkId::new("sepolia", Some(11155111)).to_string(),
            "sepolia (chain 11155111)"
        );
    }

    #[test]
    fn test_constructor_arg_serde_shape() {
        let arg = ConstructorArg::Address(Address::repeat_byte(0xab));
        let json = serde_json::to_value(&arg).unwrap();
        assert_eq!(json["type"], "address");
        assert_eq!(
            json["value"].as_str().unwrap().to_lowercase(),
            "0xabababababababababababababababababababab"
        );

        let arg = ConstructorArg::Uint256(U256::from(42));
        assert_eq!(serde_json::to_value(&arg).unwrap()["type"], "uint256");
    }

    #[test]
    fn test_constructor_arg_sol_value() {
        let address = Address::repeat_byte(0x11);
        assert_eq!(
            ConstructorArg::Address(address).to_sol_value(),
            DynSolValue::Address(address)
        );
        assert_eq!(
            ConstructorArg::Uint256(U256::from(7)).to_sol_value(),
            DynSolValue::Uint(U256::from(7), 256)
        );
    }
}

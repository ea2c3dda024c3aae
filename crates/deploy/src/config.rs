//! Resolution of raw key/value input into a [`DeploymentRequest`].
//!
//! The resolver only reads the supplied mapping: no environment access, no I/O.
//! Identical input always yields an identical request or the identical error.

use std::collections::HashMap;

use alloy_core::primitives::Address;

use crate::{ConfigError, ConstructorArg, DeploymentRequest, NetworkId};

/// Address passed as the sole constructor argument.
pub const TOKEN_ADDRESS_KEY: &str = "TOKEN_ADDRESS";
/// Artifact key of the contract to deploy.
pub const CONTRACT_NAME_KEY: &str = "CONTRACT_NAME";
/// Human-readable network name.
pub const NETWORK_KEY: &str = "NETWORK";
/// Expected chain ID of the node, checked before broadcast when set.
pub const CHAIN_ID_KEY: &str = "CHAIN_ID";

pub const DEFAULT_CONTRACT_NAME: &str = "PaymentRequest";
pub const DEFAULT_NETWORK: &str = "localhost";

/// Validate the raw configuration and build the deployment request.
pub fn resolve(raw: &HashMap<String, String>) -> Result<DeploymentRequest, ConfigError> {
    let token = required(raw, TOKEN_ADDRESS_KEY)?;
    let token = parse_address(TOKEN_ADDRESS_KEY, token)?;

    let contract = optional(raw, CONTRACT_NAME_KEY).unwrap_or(DEFAULT_CONTRACT_NAME);
    validate_contract_name(contract)?;

    let network = optional(raw, NETWORK_KEY).unwrap_or(DEFAULT_NETWORK);
    let chain_id = optional(raw, CHAIN_ID_KEY)
        .map(|value| {
            value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: CHAIN_ID_KEY.to_string(),
                value: value.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()?;

    Ok(DeploymentRequest::new(
        contract,
        vec![ConstructorArg::Address(token)],
        NetworkId::new(network, chain_id),
    ))
}

fn required<'a>(raw: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    let value = raw.get(key).ok_or_else(|| ConfigError::Missing {
        key: key.to_string(),
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Empty {
            key: key.to_string(),
        });
    }
    Ok(value)
}

/// Optional keys treat an empty value as unset.
fn optional<'a>(raw: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Parse a 0x-prefixed, 40 hex digit address.
///
/// Mixed-case input must carry a valid EIP-55 checksum. All-lowercase and
/// all-uppercase input is accepted as is.
pub fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidAddress {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };

    let Some(digits) = value.strip_prefix("0x") else {
        return Err(invalid("expected a 0x prefix".to_string()));
    };
    if digits.len() != 40 {
        return Err(invalid(format!(
            "expected 40 hex characters, got {}",
            digits.len()
        )));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters".to_string()));
    }

    let mixed_case = digits.chars().any(|c| c.is_ascii_lowercase())
        && digits.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case {
        Address::parse_checksummed(value, None)
            .map_err(|_| invalid("EIP-55 checksum mismatch".to_string()))
    } else {
        value.parse::<Address>().map_err(|e| invalid(e.to_string()))
    }
}

fn validate_contract_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: CONTRACT_NAME_KEY.to_string(),
            value: name.to_string(),
            reason: "expected a Solidity contract identifier".to_string(),
        })
    }
}

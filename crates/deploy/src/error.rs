//! Failure taxonomy of a deployment.

use alloy_core::primitives::B256;
use serde::{Deserialize, Serialize};

/// Invalid or missing deployment input. Fixed by correcting the configuration, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required key `{key}`")]
    Missing { key: String },
    #[error("`{key}` is set but empty")]
    Empty { key: String },
    #[error("`{key}` is not a valid address ({value:?}): {reason}")]
    InvalidAddress {
        key: String,
        value: String,
        reason: String,
    },
    #[error("`{key}` has an invalid value ({value:?}): {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Errors surfaced by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected response to {method}: {reason}")]
    Decode { method: String, reason: String },
    #[error("cannot determine the sender account: {reason}")]
    Sender { reason: String },
}

impl ClientError {
    /// Whether the failed request may have reached the node and been acted upon.
    ///
    /// False only when the node never saw the request (no connection) or
    /// answered with an error.
    pub fn may_have_reached_node(&self) -> bool {
        match self {
            ClientError::Transport(e) => !(e.is_connect() || e.is_builder()),
            ClientError::Decode { .. } => true,
            ClientError::Rpc { .. } | ClientError::Sender { .. } => false,
        }
    }
}

/// Stable, machine-readable tag of a [`DeploymentFailure`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Config,
    ArtifactNotFound,
    Artifact,
    Submission,
    BroadcastUnknown,
    Reverted,
    MissingContractAddress,
    ConfirmationTimeout,
    Cancelled,
}

/// Why a deployment did not produce a [`DeploymentResult`](crate::DeploymentResult).
///
/// Every variant reaches the reporter unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentFailure {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no artifact found for contract `{contract}`: {cause}")]
    ArtifactNotFound { contract: String, cause: String },

    #[error("unusable artifact for contract `{contract}`: {cause}")]
    Artifact { contract: String, cause: String },

    /// The transaction was rejected before broadcast.
    #[error("deployment transaction rejected: {cause}")]
    Submission { cause: String },

    /// Sending failed after the request reached the node, which may have accepted it.
    #[error(
        "deployment transaction may have been broadcast: {cause}; \
         inspect the chain before deploying again"
    )]
    BroadcastUnknown { cause: String },

    #[error("deployment transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: B256, block_number: u64 },

    #[error(
        "transaction {tx_hash} was mined in block {block_number} but its receipt names no contract address"
    )]
    MissingContractAddress { tx_hash: B256, block_number: u64 },

    /// The outcome is unknown: the transaction may still be mined later.
    /// Inspect the chain before deploying again, a new submission creates a second instance.
    #[error(
        "transaction {tx_hash} not confirmed after {attempts} attempts; it may still be mined, \
         inspect the chain before deploying again"
    )]
    ConfirmationTimeout { tx_hash: B256, attempts: usize },

    /// The confirmation wait was aborted. The submitted transaction is not revoked.
    #[error(
        "confirmation wait for transaction {tx_hash} cancelled after {attempts} attempts; \
         the transaction was already broadcast and may still be mined"
    )]
    Cancelled { tx_hash: B256, attempts: usize },
}

impl DeploymentFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            DeploymentFailure::Config(_) => FailureKind::Config,
            DeploymentFailure::ArtifactNotFound { .. } => FailureKind::ArtifactNotFound,
            DeploymentFailure::Artifact { .. } => FailureKind::Artifact,
            DeploymentFailure::Submission { .. } => FailureKind::Submission,
            DeploymentFailure::BroadcastUnknown { .. } => FailureKind::BroadcastUnknown,
            DeploymentFailure::Reverted { .. } => FailureKind::Reverted,
            DeploymentFailure::MissingContractAddress { .. } => FailureKind::MissingContractAddress,
            DeploymentFailure::ConfirmationTimeout { .. } => FailureKind::ConfirmationTimeout,
            DeploymentFailure::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    pub(crate) fn submission(cause: impl ToString) -> Self {
        DeploymentFailure::Submission {
            cause: cause.to_string(),
        }
    }

    /// Classify a failed `submit_deployment` call.
    pub(crate) fn from_submit_error(err: ClientError) -> Self {
        if err.may_have_reached_node() {
            DeploymentFailure::BroadcastUnknown {
                cause: err.to_string(),
            }
        } else {
            DeploymentFailure::submission(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        let failure = DeploymentFailure::ConfirmationTimeout {
            tx_hash: B256::ZERO,
            attempts: 5,
        };
        assert_eq!(failure.kind(), FailureKind::ConfirmationTimeout);
        assert_eq!(failure.kind().to_string(), "confirmation-timeout");

        let failure = DeploymentFailure::from(ConfigError::Missing {
            key: "TOKEN_ADDRESS".to_string(),
        });
        assert_eq!(failure.kind().to_string(), "config");
        assert_eq!(
            failure.to_string(),
            "invalid configuration: missing required key `TOKEN_ADDRESS`"
        );
    }

    #[test]
    fn test_timeout_message_warns_about_late_confirmation() {
        let failure = DeploymentFailure::ConfirmationTimeout {
            tx_hash: B256::repeat_byte(0x78),
            attempts: 5,
        };
        let message = failure.to_string();
        assert!(message.contains("after 5 attempts"));
        assert!(message.contains("may still be mined"));
    }

    #[test]
    fn test_submit_error_classification() {
        let rejected = DeploymentFailure::from_submit_error(ClientError::Rpc {
            code: -32000,
            message: "nonce too low".to_string(),
        });
        assert_eq!(rejected.kind(), FailureKind::Submission);

        let no_sender = DeploymentFailure::from_submit_error(ClientError::Sender {
            reason: "node has no unlocked accounts".to_string(),
        });
        assert_eq!(no_sender.kind(), FailureKind::Submission);

        let garbled = DeploymentFailure::from_submit_error(ClientError::Decode {
            method: "eth_sendTransaction".to_string(),
            reason: "no result in response".to_string(),
        });
        assert_eq!(garbled.kind(), FailureKind::BroadcastUnknown);
        assert!(garbled.to_string().contains("inspect the chain"));
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(FailureKind::ArtifactNotFound).unwrap(),
            "artifact-not-found"
        );
    }
}

//! Capability for talking to a blockchain node.

use std::future::Future;

use alloy_core::primitives::{B256, Bytes};

use crate::{ClientError, DeploymentReceipt};

/// The chain operations a deployment needs.
///
/// The client is owned by the caller; the driver only borrows it.
pub trait ChainClient: Send + Sync {
    /// The chain ID reported by the node.
    fn chain_id(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Broadcast a contract-creation transaction carrying `init_code`.
    ///
    /// An error for which [`ClientError::may_have_reached_node`] holds leaves the
    /// outcome unknown; any other error means nothing was broadcast.
    fn submit_deployment(
        &self,
        init_code: Bytes,
    ) -> impl Future<Output = Result<B256, ClientError>> + Send;

    /// The receipt of `tx_hash`, or `None` while it is not yet included in a block.
    fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<Option<DeploymentReceipt>, ClientError>> + Send;
}

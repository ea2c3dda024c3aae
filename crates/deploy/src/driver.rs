//! The deploy-and-confirm protocol.
//!
//! A deployment goes through four steps:
//! 1. look up the contract factory in the [`ArtifactSource`],
//! 2. build the creation code, check the target chain and submit it through the [`ChainClient`],
//! 3. poll for the receipt with a bounded exponential backoff,
//! 4. read the deployed address back from the receipt.
//!
//! The driver is not idempotent: every call submits a new transaction and creates a
//! new contract instance. It never resubmits on its own, the only retry is the receipt poll.

use std::{
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy_core::primitives::B256;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};

use crate::{
    ArtifactSource, ChainClient, ClientError, DeploymentFailure, DeploymentReceipt,
    DeploymentRequest, DeploymentResult, NetworkId,
};

/// Backoff schedule of the confirmation wait.
///
/// The first poll happens right after submission; poll `n + 1` follows poll `n`
/// after `base_delay_ms * factor^(n - 1)`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationPolicy {
    pub base_delay_ms: u64,
    pub factor: f32,
    pub max_delay_ms: u64,
    /// Total number of receipt polls, including the first one.
    pub max_attempts: usize,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            factor: 2.0,
            max_delay_ms: 60_000,
            max_attempts: 5,
        }
    }
}

impl ConfirmationPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_factor(self.factor)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }
}

/// Why a single receipt poll did not confirm the transaction.
#[derive(Debug, thiserror::Error)]
enum PollError {
    #[error("transaction not yet included in a block")]
    Pending,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Publishes one contract instance per call and waits for its confirmation.
#[derive(Debug, Clone)]
pub struct DeploymentDriver<A, C> {
    artifacts: A,
    client: C,
    policy: ConfirmationPolicy,
}

impl<A, C> DeploymentDriver<A, C>
where
    A: ArtifactSource,
    C: ChainClient,
{
    pub fn new(artifacts: A, client: C) -> Self {
        Self {
            artifacts,
            client,
            policy: ConfirmationPolicy::default(),
        }
    }

    pub fn with_confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Deploy the requested contract and wait for its confirmation.
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult, DeploymentFailure> {
        self.deploy_until(request, std::future::pending()).await
    }

    /// Like [`deploy`](Self::deploy), but stops waiting for confirmation once `cancel` completes.
    ///
    /// Cancellation only ends the driver's own wait with [`DeploymentFailure::Cancelled`]:
    /// a transaction already broadcast cannot be revoked and may still be mined.
    pub async fn deploy_until<F>(
        &self,
        request: &DeploymentRequest,
        cancel: F,
    ) -> Result<DeploymentResult, DeploymentFailure>
    where
        F: Future<Output = ()>,
    {
        let factory = self.artifacts.get_factory(request.contract())?;
        let init_code = factory.deployment_code(request.args())?;

        self.check_network(request.network()).await?;

        tracing::info!(
            contract = request.contract(),
            network = %request.network(),
            init_code_len = init_code.len(),
            "Submitting deployment transaction..."
        );

        let tx_hash = self
            .client
            .submit_deployment(init_code)
            .await
            .map_err(DeploymentFailure::from_submit_error)?;

        tracing::info!(%tx_hash, "Deployment transaction submitted, waiting for confirmation...");

        let attempts = AtomicUsize::new(0);
        let receipt = tokio::select! {
            biased;
            _ = cancel => {
                let attempts = attempts.load(Ordering::Relaxed);
                tracing::warn!(%tx_hash, attempts, "Confirmation wait cancelled");
                return Err(DeploymentFailure::Cancelled { tx_hash, attempts });
            }
            receipt = self.await_confirmation(tx_hash, &attempts) => receipt?,
        };
        let attempts = attempts.load(Ordering::Relaxed);

        if !receipt.status {
            return Err(DeploymentFailure::Reverted {
                tx_hash,
                block_number: receipt.block_number,
            });
        }

        let address = receipt
            .contract_address
            .ok_or(DeploymentFailure::MissingContractAddress {
                tx_hash,
                block_number: receipt.block_number,
            })?;

        tracing::info!(
            %address,
            %tx_hash,
            block_number = receipt.block_number,
            attempts,
            "Deployment confirmed"
        );

        Ok(DeploymentResult::confirmed(
            request, address, &receipt, attempts,
        ))
    }

    /// Refuse to broadcast to a node on another chain than the request expects.
    async fn check_network(&self, network: &NetworkId) -> Result<(), DeploymentFailure> {
        let Some(expected) = network.chain_id else {
            return Ok(());
        };

        let actual = self.client.chain_id().await.map_err(|e| {
            DeploymentFailure::submission(format!("failed to query the node's chain ID: {}", e))
        })?;

        if actual != expected {
            return Err(DeploymentFailure::submission(format!(
                "node is on chain {}, but network `{}` expects chain {}",
                actual, network.name, expected
            )));
        }

        Ok(())
    }

    /// Poll for the receipt until it shows up or the attempts run out.
    ///
    /// RPC errors count as failed attempts, so a briefly unavailable node does not
    /// abort the wait.
    async fn await_confirmation(
        &self,
        tx_hash: B256,
        attempts: &AtomicUsize,
    ) -> Result<DeploymentReceipt, DeploymentFailure> {
        let client = &self.client;
        let poll = move || async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(%tx_hash, attempt, "Polling for receipt");
            client
                .transaction_receipt(tx_hash)
                .await?
                .ok_or(PollError::Pending)
        };

        poll.retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .notify(|err: &PollError, delay: Duration| {
                tracing::debug!(%tx_hash, error = %err, ?delay, "Not confirmed yet, retrying...");
            })
            .await
            .map_err(|err| {
                let attempts = attempts.load(Ordering::Relaxed);
                tracing::warn!(%tx_hash, attempts, error = %err, "Gave up waiting for confirmation");
                DeploymentFailure::ConfirmationTimeout { tx_hash, attempts }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ConfirmationPolicy::default();
        assert_eq!(policy.base_delay_ms, 1_000);
        assert_eq!(policy.factor, 2.0);
        assert_eq!(policy.max_attempts, 5);
    }

    #[test]
    fn test_backoff_schedule() {
        use backon::BackoffBuilder;

        let delays: Vec<Duration> = ConfirmationPolicy::default().backoff().build().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn test_backoff_single_attempt() {
        use backon::BackoffBuilder;

        let policy = ConfirmationPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        assert_eq!(policy.backoff().build().count(), 0);
    }
}

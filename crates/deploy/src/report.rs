//! Rendering of a deployment outcome and its mapping to a process exit code.

use std::{io::Write, path::Path};

use alloy_core::primitives::{Address, B256};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use serde::{Deserialize, Serialize};

use crate::{DeploymentFailure, DeploymentResult, FailureKind};

/// Exit code of a confirmed deployment.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code of every failed deployment, whatever its kind.
pub const EXIT_FAILURE: u8 = 1;

/// How the outcome is written out.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Structured record of a deployment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DeploymentRecord {
    Deployed {
        contract: String,
        network: String,
        chain_id: Option<u64>,
        address: Address,
        tx_hash: B256,
        block_number: u64,
        deployed_at: String,
        exit_code: u8,
    },
    Failed {
        kind: FailureKind,
        message: String,
        exit_code: u8,
    },
}

impl DeploymentRecord {
    pub fn from_outcome(outcome: &Result<DeploymentResult, DeploymentFailure>) -> Self {
        match outcome {
            Ok(result) => DeploymentRecord::Deployed {
                contract: result.contract().to_string(),
                network: result.network().name.clone(),
                chain_id: result.network().chain_id,
                address: result.address(),
                tx_hash: result.tx_hash(),
                block_number: result.block_number(),
                deployed_at: chrono::Utc::now().to_rfc3339(),
                exit_code: EXIT_SUCCESS,
            },
            Err(failure) => DeploymentRecord::Failed {
                kind: failure.kind(),
                message: failure.to_string(),
                exit_code: EXIT_FAILURE,
            },
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            DeploymentRecord::Deployed { exit_code, .. }
            | DeploymentRecord::Failed { exit_code, .. } => *exit_code,
        }
    }

    /// Persist the record as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Deployment record saved");
        Ok(())
    }

    fn render_text(&self, out: &mut impl Write) -> std::io::Result<()> {
        match self {
            DeploymentRecord::Deployed {
                contract,
                network,
                chain_id,
                address,
                tx_hash,
                block_number,
                ..
            } => {
                writeln!(out, "✅ {} deployed to: {}", contract, address)?;

                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.add_row(vec![Cell::new("Network"), Cell::new(network)]);
                if let Some(chain_id) = chain_id {
                    table.add_row(vec![Cell::new("Chain ID"), Cell::new(chain_id)]);
                }
                table.add_row(vec![Cell::new("Address"), Cell::new(address)]);
                table.add_row(vec![Cell::new("Transaction"), Cell::new(tx_hash)]);
                table.add_row(vec![Cell::new("Block"), Cell::new(block_number)]);
                writeln!(out, "{}", table)
            }
            DeploymentRecord::Failed { kind, message, .. } => {
                writeln!(out, "❌ Deployment failed [{}]: {}", kind, message)
            }
        }
    }
}

/// Write the outcome to `out` and return its record; the record carries the exit code.
///
/// A confirmed deployment exits with [`EXIT_SUCCESS`], every failure with [`EXIT_FAILURE`],
/// distinguished only by the reported kind and message.
pub fn report(
    outcome: &Result<DeploymentResult, DeploymentFailure>,
    format: ReportFormat,
    out: &mut impl Write,
) -> std::io::Result<DeploymentRecord> {
    if let Err(failure) = outcome {
        tracing::error!(kind = %failure.kind(), error = %failure, "Deployment failed");
    }

    let record = DeploymentRecord::from_outcome(outcome);
    match format {
        ReportFormat::Text => record.render_text(out)?,
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &record)?;
            writeln!(out)?;
        }
    }

    Ok(record)
}

use std::{collections::HashMap, path::PathBuf};

use alloy_core::primitives::Address;
use clap::Parser;
use payreq_deploy::{
    ReportFormat, SETTINGS_FILE, Settings,
    config::{CHAIN_ID_KEY, CONTRACT_NAME_KEY, NETWORK_KEY, TOKEN_ADDRESS_KEY},
};
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "payreq")]
#[command(
    author,
    version,
    about = "Deploy the PaymentRequest contract and wait for its confirmation"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "PAYREQ_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Address of the ERC-20 token the contract accepts payments in.
    ///
    /// Passed as the sole constructor argument.
    #[arg(long, env = TOKEN_ADDRESS_KEY)]
    pub token_address: Option<String>,

    /// Name of the contract artifact to deploy.
    ///
    /// Defaults to PaymentRequest.
    #[arg(long, alias = "contract", env = CONTRACT_NAME_KEY)]
    pub contract_name: Option<String>,

    /// A name for the target network, used in logs and records.
    #[arg(short, long, env = NETWORK_KEY)]
    pub network: Option<String>,

    /// The chain ID the node must report before anything is broadcast.
    #[arg(long, env = CHAIN_ID_KEY)]
    pub chain_id: Option<String>,

    /// The URL of the JSON-RPC endpoint.
    #[arg(long, alias = "rpc", env = "PAYREQ_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// The account to deploy from. It must be unlocked on the node.
    ///
    /// If not provided, the node's first account is used.
    #[arg(long, alias = "from", env = "PAYREQ_SENDER")]
    pub sender: Option<Address>,

    /// The path to the compiled artifacts directory.
    #[arg(long, env = "PAYREQ_ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Write the deployment record as JSON to this path.
    #[arg(long, env = "PAYREQ_RECORD")]
    pub record: Option<PathBuf>,

    /// Output format of the final report.
    #[arg(long, env = "PAYREQ_FORMAT", default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Path to a settings file. A missing file is ignored.
    #[arg(long, alias = "conf", env = "PAYREQ_CONFIG", default_value = SETTINGS_FILE)]
    pub config: PathBuf,
}

impl Cli {
    /// The raw deployment input, as handed to the config resolver.
    pub fn raw_config(&self) -> HashMap<String, String> {
        [
            (TOKEN_ADDRESS_KEY, &self.token_address),
            (CONTRACT_NAME_KEY, &self.contract_name),
            (NETWORK_KEY, &self.network),
            (CHAIN_ID_KEY, &self.chain_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|value| (key.to_string(), value)))
        .collect()
    }

    /// Apply command line overrides on top of the loaded settings.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(rpc_url) = &self.rpc_url {
            settings.rpc_url = rpc_url.clone();
        }
        if let Some(sender) = self.sender {
            settings.sender = Some(sender);
        }
        if let Some(artifacts_dir) = &self.artifacts_dir {
            settings.artifacts_dir = artifacts_dir.clone();
        }
        if let Some(record) = &self.record {
            settings.record = Some(record.clone());
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_runs_without_flags() {
        let cli = Cli::try_parse_from(["payreq"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(SETTINGS_FILE));
        assert_eq!(cli.format, ReportFormat::Text);
    }

    #[test]
    fn test_raw_config_skips_unset_keys() {
        let cli = Cli::try_parse_from([
            "payreq",
            "--token-address",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--chain-id",
            "31337",
        ])
        .unwrap();
        let raw = cli.raw_config();
        assert_eq!(
            raw.get(TOKEN_ADDRESS_KEY).map(String::as_str),
            Some("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert_eq!(raw.get(CHAIN_ID_KEY).map(String::as_str), Some("31337"));
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "payreq",
            "--rpc-url",
            "http://127.0.0.1:9545",
            "--artifacts-dir",
            "out/artifacts",
        ])
        .unwrap();
        let settings = cli.apply(Settings::default());
        assert_eq!(settings.rpc_url.as_str(), "http://127.0.0.1:9545/");
        assert_eq!(settings.artifacts_dir, PathBuf::from("out/artifacts"));
        assert_eq!(settings.record, None);
    }
}

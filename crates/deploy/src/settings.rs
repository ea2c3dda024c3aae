//! Layered driver settings.
//!
//! Settings describe *how* to deploy (node, sender, artifacts, confirmation wait),
//! as opposed to the [`DeploymentRequest`](crate::DeploymentRequest) which describes
//! *what* to deploy. They are merged from, lowest to highest priority:
//! built-in defaults, a TOML file, and `PAYREQ_*` environment variables
//! (nested keys separated by `__`, e.g. `PAYREQ_CONFIRMATION__MAX_ATTEMPTS`).

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ConfirmationPolicy, artifact::DEFAULT_ARTIFACTS_DIR, rpc::DEFAULT_RPC_URL};

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "payreq.toml";

/// Prefix of the environment variables overriding settings.
pub const ENV_PREFIX: &str = "PAYREQ_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON-RPC endpoint of the node.
    pub rpc_url: Url,
    /// Account to deploy from. Defaults to the node's first unlocked account.
    pub sender: Option<Address>,
    /// Root of the compiled artifacts.
    pub artifacts_dir: PathBuf,
    /// Where to write the deployment record, if anywhere.
    pub record: Option<PathBuf>,
    pub confirmation: ConfirmationPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: Url::parse(DEFAULT_RPC_URL).expect("default RPC URL is valid"),
            sender: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            record: None,
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

impl Settings {
    /// The provider stack settings are extracted from. A missing file is not an error.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate settings from `path` and the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load settings (file: {})", path.display()))?;

        settings.validate()?;

        tracing::debug!(
            rpc_url = %settings.rpc_url,
            artifacts_dir = %settings.artifacts_dir.display(),
            max_attempts = settings.confirmation.max_attempts,
            "Loaded settings"
        );

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.confirmation.max_attempts == 0 {
            anyhow::bail!("confirmation.max_attempts must be at least 1");
        }
        if !self.confirmation.factor.is_finite() || self.confirmation.factor < 1.0 {
            anyhow::bail!(
                "confirmation.factor must be at least 1.0, got {}",
                self.confirmation.factor
            );
        }
        if self.confirmation.max_delay_ms < self.confirmation.base_delay_ms {
            anyhow::bail!(
                "confirmation.max_delay_ms ({}) is below confirmation.base_delay_ms ({})",
                self.confirmation.max_delay_ms,
                self.confirmation.base_delay_ms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    fn load_in_jail() -> figment::error::Result<Settings> {
        Settings::load(Path::new(SETTINGS_FILE)).map_err(|e| format!("{:#}", e).into())
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let settings = load_in_jail()?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.rpc_url.as_str(), "http://localhost:8545/");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                SETTINGS_FILE,
                r#"
                rpc_url = "https://ethereum-sepolia-rpc.publicnode.com"
                artifacts_dir = "build/artifacts"

                [confirmation]
                base_delay_ms = 500
                max_attempts = 8
                "#,
            )?;
            jail.set_env("PAYREQ_CONFIRMATION__MAX_ATTEMPTS", "3");
            jail.set_env("PAYREQ_SENDER", "0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

            let settings = load_in_jail()?;
            assert_eq!(
                settings.rpc_url.as_str(),
                "https://ethereum-sepolia-rpc.publicnode.com/"
            );
            assert_eq!(settings.artifacts_dir, PathBuf::from("build/artifacts"));
            assert_eq!(settings.confirmation.base_delay_ms, 500);
            assert_eq!(settings.confirmation.factor, 2.0);
            assert_eq!(settings.confirmation.max_attempts, 3);
            assert_eq!(
                settings.sender,
                Some("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap())
            );
            Ok(())
        });
    }

    #[test]
    fn test_rejects_zero_attempts() {
        Jail::expect_with(|jail| {
            jail.set_env("PAYREQ_CONFIRMATION__MAX_ATTEMPTS", "0");
            let err = load_in_jail().unwrap_err();
            assert!(err.to_string().contains("max_attempts"));
            Ok(())
        });
    }

    #[test]
    fn test_rejects_invalid_url() {
        Jail::expect_with(|jail| {
            jail.set_env("PAYREQ_RPC_URL", "not a url");
            assert!(load_in_jail().is_err());
            Ok(())
        });
    }
}

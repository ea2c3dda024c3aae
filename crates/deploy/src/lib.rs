//! payreq-deploy - Contract deployment library.
//!
//! This crate publishes a compiled contract to an EVM network and confirms its
//! on-chain presence. Input is validated by the [`config`] resolver, the
//! [`DeploymentDriver`] submits the deployment and waits for its receipt through
//! injected [`ArtifactSource`] and [`ChainClient`] capabilities, and the
//! [`report`] module maps the outcome to a structured record and an exit code.

mod artifact;
pub use artifact::{ContractFactory, DEFAULT_ARTIFACTS_DIR, HardhatArtifacts};

pub mod config;

mod driver;
pub use driver::{ConfirmationPolicy, DeploymentDriver};

mod error;
pub use error::{ClientError, ConfigError, DeploymentFailure, FailureKind};

pub mod report;
pub use report::{DeploymentRecord, ReportFormat};

pub mod rpc;
pub use rpc::JsonRpcChainClient;

mod settings;
pub use settings::{ENV_PREFIX, SETTINGS_FILE, Settings};

mod traits;
pub use traits::{ArtifactSource, ChainClient};

mod types;
pub use types::{
    ConstructorArg, DeploymentReceipt, DeploymentRequest, DeploymentResult, NetworkId,
};

//! Compiled contract artifacts and the factory building deployment code from them.

use std::path::{Path, PathBuf};

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde::Deserialize;

use crate::{ArtifactSource, ConstructorArg, DeploymentFailure};

/// Default location of compiled artifacts, relative to the project root.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Builds contract-creation code for one compiled contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractFactory {
    name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

impl ContractFactory {
    pub fn new(name: impl Into<String>, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    ///
    /// Arity and types are checked against the constructor in the ABI; a
    /// mismatch is a [`DeploymentFailure::Submission`] since it is caught
    /// before anything is broadcast.
    pub fn deployment_code(&self, args: &[ConstructorArg]) -> Result<Bytes, DeploymentFailure> {
        if self.bytecode.is_empty() {
            return Err(DeploymentFailure::submission(format!(
                "`{}` has no creation bytecode (abstract contract or interface?)",
                self.name
            )));
        }

        let inputs = self
            .abi
            .constructor()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default();

        if inputs.len() != args.len() {
            return Err(DeploymentFailure::submission(format!(
                "`{}` constructor takes {} argument(s), got {}",
                self.name,
                inputs.len(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (param, arg)) in inputs.iter().zip(args).enumerate() {
            let ty = DynSolType::parse(&param.ty).map_err(|e| {
                DeploymentFailure::submission(format!(
                    "unsupported constructor parameter type `{}`: {}",
                    param.ty, e
                ))
            })?;
            let value = arg.to_sol_value();
            if !ty.matches(&value) {
                return Err(DeploymentFailure::submission(format!(
                    "constructor argument #{} (`{}`) expects {}, got {} {}",
                    index,
                    param.name,
                    param.ty,
                    arg.sol_type(),
                    arg
                )));
            }
            values.push(value);
        }

        let encoded = DynSolValue::Tuple(values).abi_encode_params();
        let mut code = Vec::with_capacity(self.bytecode.len() + encoded.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(&encoded);

        Ok(code.into())
    }
}

/// The subset of a Hardhat artifact file needed for deployment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

/// Artifacts laid out by Hardhat: `<root>/contracts/<Name>.sol/<Name>.json`.
///
/// Contracts compiled from a source file with a different name are found by
/// searching `root` recursively. A name defined by more than one source file
/// is ambiguous and refused.
#[derive(Debug, Clone)]
pub struct HardhatArtifacts {
    root: PathBuf,
}

impl HardhatArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `<contract>.json` under the root, in path order.
    fn candidates(&self, contract: &str) -> Vec<PathBuf> {
        let file_name = format!("{}.json", contract);
        walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "build-info")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name.as_str())
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl ArtifactSource for HardhatArtifacts {
    fn get_factory(&self, contract: &str) -> Result<ContractFactory, DeploymentFailure> {
        if !self.root.is_dir() {
            return Err(DeploymentFailure::ArtifactNotFound {
                contract: contract.to_string(),
                cause: format!(
                    "artifacts directory {} does not exist, compile the contracts first",
                    self.root.display()
                ),
            });
        }

        let unusable = |cause: String| DeploymentFailure::Artifact {
            contract: contract.to_string(),
            cause,
        };

        let mut candidates = self.candidates(contract);
        let path = match candidates.len() {
            0 => {
                return Err(DeploymentFailure::ArtifactNotFound {
                    contract: contract.to_string(),
                    cause: format!("no {}.json under {}", contract, self.root.display()),
                });
            }
            1 => candidates.remove(0),
            _ => {
                let paths: Vec<String> = candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(unusable(format!(
                    "multiple artifacts match, rename one of the contracts: {}",
                    paths.join(", ")
                )));
            }
        };

        tracing::debug!(contract, path = %path.display(), "Loading artifact");

        let content = std::fs::read_to_string(&path)
            .map_err(|e| unusable(format!("failed to read {}: {}", path.display(), e)))?;
        let artifact: HardhatArtifact = serde_json::from_str(&content)
            .map_err(|e| unusable(format!("failed to parse {}: {}", path.display(), e)))?;

        if artifact.contract_name != contract {
            return Err(unusable(format!(
                "{} describes `{}`",
                path.display(),
                artifact.contract_name
            )));
        }

        Ok(ContractFactory::new(
            artifact.contract_name,
            artifact.abi,
            artifact.bytecode,
        ))
    }
}

//! Capability for looking up compiled contracts.

use crate::{ContractFactory, DeploymentFailure};

/// A source of compiled contract artifacts.
///
/// Implementations fail with [`DeploymentFailure::ArtifactNotFound`] when no
/// artifact exists for the name, and [`DeploymentFailure::Artifact`] when one
/// exists but cannot be used.
pub trait ArtifactSource {
    /// Return a factory able to build deployment code for `contract`.
    fn get_factory(&self, contract: &str) -> Result<ContractFactory, DeploymentFailure>;
}

impl<T: ArtifactSource + ?Sized> ArtifactSource for &T {
    fn get_factory(&self, contract: &str) -> Result<ContractFactory, DeploymentFailure> {
        (**self).get_factory(contract)
    }
}

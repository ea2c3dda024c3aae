//! Capabilities injected into the deployment driver.
//!
//! The driver never reaches a compiler, a node or a signer directly: it consumes
//! an [`ArtifactSource`] for compiled contracts and a [`ChainClient`] for the
//! network, so it can run against mocks as well as a live node.

mod client;
mod source;

pub use client::ChainClient;
pub use source::ArtifactSource;

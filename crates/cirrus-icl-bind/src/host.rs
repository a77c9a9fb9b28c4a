//! The provider-host boundary.
//!
//! Package schemas are served by a resource-provider process reached over
//! some transport (subprocess, network); that transport is the embedder's
//! concern. The binder sees only these two traits and calls them at one
//! well-defined point, the schema pre-pass, memoized per package name.

use std::error::Error;

/// Error type for host implementations.
pub type HostError = Box<dyn Error + Send + Sync + 'static>;

/// Resolves package names to provider handles.
pub trait SchemaHost {
    /// Obtain a provider for `package` at an optional version.
    fn provider(
        &self,
        package: &str,
        version: Option<&str>,
    ) -> Result<Box<dyn ProviderHandle + '_>, HostError>;
}

/// A handle to one provider, able to serve its schema document.
pub trait ProviderHandle {
    /// Fetch the package schema as JSON bytes.
    fn get_schema(&self, version: u32) -> Result<Vec<u8>, HostError>;
}

//! Backend selection: auto-detection and explicit lookup.

use std::path::Path;

use tracing::debug;

use crate::error::VcsError;

use super::{GitProvider, SvnProvider, VcsKind, VcsProvider};

/// Ordered set of providers probed during auto-detection.
pub struct VcsRegistry {
    providers: Vec<Box<dyn VcsProvider>>,
}

impl VcsRegistry {
    /// Registry over an explicit provider list, probed in the given order.
    pub fn new(providers: Vec<Box<dyn VcsProvider>>) -> Self {
        Self { providers }
    }

    /// First provider whose marker is present under `path`.
    pub fn detect(&self, path: &Path) -> Option<&dyn VcsProvider> {
        let found = self
            .providers
            .iter()
            .find(|p| p.is_repository(path))
            .map(|p| p.as_ref());
        debug!(
            "VCS detection for {}: {}",
            path.display(),
            found.map_or("none", |p| p.kind().as_str())
        );
        found
    }

    /// Take ownership of the detected provider.
    pub fn into_detected(self, path: &Path) -> Option<Box<dyn VcsProvider>> {
        self.providers.into_iter().find(|p| p.is_repository(path))
    }
}

impl Default for VcsRegistry {
    /// Git before SVN.
    fn default() -> Self {
        Self::new(vec![Box::new(GitProvider::new()), Box::new(SvnProvider::new())])
    }
}

/// Auto-detect the backend for `path`. `None` when neither marker exists.
pub fn detect_provider(path: &Path) -> Option<Box<dyn VcsProvider>> {
    VcsRegistry::default().into_detected(path)
}

/// Construct the provider for a known backend.
pub fn provider_for_kind(kind: VcsKind) -> Box<dyn VcsProvider> {
    match kind {
        VcsKind::Git => Box::new(GitProvider::new()),
        VcsKind::Svn => Box::new(SvnProvider::new()),
    }
}

/// Construct a provider from a selector string such as `"git"`.
pub fn provider_for_type(selector: &str) -> Result<Box<dyn VcsProvider>, VcsError> {
    let kind: VcsKind = selector.parse()?;
    Ok(provider_for_kind(kind))
}

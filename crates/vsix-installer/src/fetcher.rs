//! Seam between the engine and the HTTP client

use camino::Utf8Path;
use std::future::Future;
use url::Url;
use vsix_core::error::VsixResult;
use vsix_registry::{FetchOutcome, VsixClient};

/// Something that can GET a URL into a file
pub trait ArtifactFetcher {
    fn fetch(
        &self,
        url: &Url,
        dest: &Utf8Path,
    ) -> impl Future<Output = VsixResult<FetchOutcome>> + Send;
}

impl ArtifactFetcher for VsixClient {
    async fn fetch(&self, url: &Url, dest: &Utf8Path) -> VsixResult<FetchOutcome> {
        self.download(url, dest).await
    }
}

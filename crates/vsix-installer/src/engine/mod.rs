//! Fetch-and-recover loop
//!
//! Drains a [`WorkQueue`] one token at a time. Each head goes through
//! `Pending -> Fetching -> Installing` and only then leaves the queue. A 429
//! gets exactly one retry after the server's reset time; a second 429 for the
//! same head, or any other HTTP failure, ends the run with the rest of the
//! queue untouched.

mod report;

pub use report::{CompanionBundle, CompletedItem, RunReport};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local, Utc};
use tracing::{debug, error, info, warn};
use url::Url;
use vsix_config::{CompanionConfig, VsixConfig};
use vsix_core::error::{VsixError, VsixResult};
use vsix_core::utils::{artifact_file_name, create_download_dir};
use vsix_core::{Channel, IdentifierFormat, PackageIdentifier, UpstreamName, UpstreamTable};
use vsix_registry::{FetchOutcome, RateLimitStatus};

use crate::companion::{bundle_file_name, bundle_url, is_companion_trigger};
use crate::fetcher::ArtifactFetcher;
use crate::process::{InstallOutcome, Installer};
use crate::queue::WorkQueue;

/// Everything the loop needs to know, fixed for the whole run
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub upstream: UpstreamName,
    pub upstreams: UpstreamTable,
    pub identifier_format: IdentifierFormat,
    /// Parent of the per-run `vsix-YYYYmmdd-HHMMSS` directory
    pub download_root: Utf8PathBuf,
    pub download_only: bool,
    pub channel: Channel,
    pub companion: Option<CompanionConfig>,
}

impl FetchSettings {
    pub fn from_config(config: &VsixConfig) -> Self {
        Self {
            upstream: config.upstream,
            upstreams: config.upstreams.clone(),
            identifier_format: config.identifier_format.clone(),
            download_root: config.download_dir.clone(),
            download_only: config.download_only,
            channel: config.channel,
            companion: config.companion.clone(),
        }
    }
}

/// A token resolved to its download URL without fetching anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFetch {
    pub token: String,
    pub identifier: PackageIdentifier,
    pub url: Url,
}

/// The head of the queue, parsed and resolved
#[derive(Debug)]
struct Attempt {
    identifier: PackageIdentifier,
    url: Url,
    artifact: Utf8PathBuf,
}

#[derive(Debug)]
enum FetchState {
    Pending,
    Fetching(Attempt),
    RateLimitedFirst(Attempt, RateLimitStatus),
    RateLimitedExhausted(Attempt),
    Installing {
        attempt: Attempt,
        bytes: u64,
        rate_limit: RateLimitStatus,
    },
    Done,
}

pub struct Engine<F, I> {
    settings: FetchSettings,
    fetcher: F,
    installer: I,
}

impl<F, I> Engine<F, I>
where
    F: ArtifactFetcher + Sync,
    I: Installer + Sync,
{
    pub fn new(settings: FetchSettings, fetcher: F, installer: I) -> Self {
        Self {
            settings,
            fetcher,
            installer,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    /// Parse and resolve every token, stopping at the first bad one
    pub fn plan(&self, tokens: &[String]) -> VsixResult<Vec<PlannedFetch>> {
        tokens
            .iter()
            .map(|token| {
                let (identifier, url) = self.resolve(token)?;
                Ok(PlannedFetch {
                    token: token.clone(),
                    identifier,
                    url,
                })
            })
            .collect()
    }

    /// Drain `tokens` in order
    pub async fn run(&self, tokens: Vec<String>) -> VsixResult<RunReport> {
        self.run_started_at(tokens, Local::now()).await
    }

    /// Drain `tokens`, naming the download directory after `started`
    pub async fn run_started_at(
        &self,
        tokens: Vec<String>,
        started: DateTime<Local>,
    ) -> VsixResult<RunReport> {
        let mut report = RunReport::default();
        let mut queue = WorkQueue::new(tokens);

        if queue.is_empty() {
            info!("No extensions to install");
            return Ok(report);
        }

        let download_dir = create_download_dir(&self.settings.download_root, &started)?;
        info!("Downloading {} extension(s) into {}", queue.len(), download_dir);
        report.download_dir = Some(download_dir.clone());

        let mut state = FetchState::Pending;
        loop {
            state = match state {
                FetchState::Pending => match queue.head() {
                    None => FetchState::Done,
                    Some(token) => {
                        let (identifier, url) = self.resolve(token)?;
                        let artifact = download_dir.join(artifact_file_name(token, "vsix")?);
                        info!(
                            "[{}/{}] Downloading {} from {}",
                            queue.position(),
                            queue.len(),
                            identifier,
                            self.settings.upstream
                        );
                        FetchState::Fetching(Attempt {
                            identifier,
                            url,
                            artifact,
                        })
                    }
                },

                FetchState::Fetching(attempt) => {
                    debug!("GET {} -> {}", attempt.url, attempt.artifact);
                    match self.fetcher.fetch(&attempt.url, &attempt.artifact).await? {
                        FetchOutcome::Downloaded {
                            bytes, rate_limit, ..
                        } => FetchState::Installing {
                            attempt,
                            bytes,
                            rate_limit,
                        },
                        FetchOutcome::RateLimited(status) => {
                            if queue.consume_retry() {
                                FetchState::RateLimitedFirst(attempt, status)
                            } else {
                                FetchState::RateLimitedExhausted(attempt)
                            }
                        }
                    }
                }

                FetchState::RateLimitedFirst(attempt, status) => {
                    warn!(
                        "Rate limited on {} (limit: {:?}, remaining: {:?}, reset: {:?}), will retry",
                        attempt.identifier, status.limit, status.remaining, status.reset_at
                    );
                    report.rate_limit_retries += 1;
                    wait_for_reset(&status).await;
                    FetchState::Fetching(attempt)
                }

                FetchState::RateLimitedExhausted(attempt) => {
                    error!(
                        "Rate limited on {} but already retried, giving up with {} item(s) left",
                        attempt.identifier,
                        queue.remaining().len()
                    );
                    return Err(VsixError::RateLimitExhausted {
                        identifier: attempt.identifier.to_string(),
                        retries: queue.retries_used(),
                    });
                }

                FetchState::Installing {
                    attempt,
                    bytes,
                    rate_limit,
                } => {
                    let install = if self.settings.download_only {
                        None
                    } else {
                        let outcome = self
                            .installer
                            .install(&attempt.artifact, self.settings.channel)
                            .await;
                        if let InstallOutcome::Failed { message, .. } = &outcome {
                            warn!("Installing {} failed: {}", attempt.identifier, message);
                        }
                        Some(outcome)
                    };

                    if rate_limit.is_signalled() {
                        debug!(
                            "Quota after {}: limit {:?}, remaining {:?}",
                            attempt.identifier, rate_limit.limit, rate_limit.remaining
                        );
                    }

                    let bundle = self
                        .companion_step(&attempt.identifier, &download_dir)
                        .await?;
                    if let Some(bundle) = bundle {
                        report.companion_bundles.push(bundle);
                    }

                    report.completed.push(CompletedItem {
                        identifier: attempt.identifier,
                        artifact: attempt.artifact,
                        bytes,
                        install,
                    });
                    queue.advance();

                    if rate_limit.is_depleted() && !queue.is_drained() {
                        info!("Rate limit window used up, waiting for it to reset");
                        wait_for_reset(&rate_limit).await;
                    }
                    FetchState::Pending
                }

                FetchState::Done => break,
            };
        }

        info!("All extensions processed");
        Ok(report)
    }

    fn resolve(&self, token: &str) -> VsixResult<(PackageIdentifier, Url)> {
        let identifier = self.settings.identifier_format.parse(token)?;
        let url = self
            .settings
            .upstreams
            .resolve(self.settings.upstream, &identifier)?;
        Ok((identifier, url))
    }

    /// Fetch the server bundle when `identifier` is the companion trigger
    async fn companion_step(
        &self,
        identifier: &PackageIdentifier,
        download_dir: &Utf8Path,
    ) -> VsixResult<Option<CompanionBundle>> {
        let Some(companion) = &self.settings.companion else {
            return Ok(None);
        };
        if !is_companion_trigger(identifier, &companion.marker) {
            return Ok(None);
        }

        let code = self.installer.version_info(self.settings.channel).await?;
        let url = bundle_url(&companion.url_template, &code.commit, self.settings.channel)?;
        let path = download_dir.join(bundle_file_name(&code.version)?);
        info!(
            "Downloading VS Code server {} ({}) for {}",
            code.version, code.commit, identifier
        );

        match self.fetcher.fetch(&url, &path).await? {
            FetchOutcome::Downloaded { .. } => Ok(Some(CompanionBundle {
                version: code.version,
                commit: code.commit,
                path,
            })),
            FetchOutcome::RateLimited(_) => Err(VsixError::http_status(url.as_str(), 429)),
        }
    }
}

async fn wait_for_reset(status: &RateLimitStatus) {
    match status.wait_duration(Utc::now()) {
        Some(wait) if !wait.is_zero() => {
            info!("Sleeping {:.1}s until the rate limit resets", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
        _ => debug!("No reset time to wait for"),
    }
}

#[cfg(test)]
mod tests;

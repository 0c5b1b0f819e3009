//! Unit tests for the fetch-and-recover loop.

use super::*;
use crate::companion::CodeVersion;
use chrono::TimeZone;
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;
use vsix_config::settings::DEFAULT_COMPANION_URL;

/// Scripted reply for one fetch
#[derive(Debug, Clone)]
enum Reply {
    Ok(RateLimitStatus),
    RateLimited(RateLimitStatus),
    Status(u16),
}

#[derive(Default)]
struct FakeFetcher {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(Url, Utf8PathBuf)>>,
}

impl FakeFetcher {
    fn with(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        }
    }

    fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.to_string())
            .collect()
    }

    fn dests(&self) -> Vec<Utf8PathBuf> {
        self.calls.lock().unwrap().iter().map(|(_, d)| d.clone()).collect()
    }
}

impl ArtifactFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url, dest: &Utf8Path) -> VsixResult<FetchOutcome> {
        self.calls.lock().unwrap().push((url.clone(), dest.to_path_buf()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ok(RateLimitStatus::default()));

        match reply {
            Reply::Ok(rate_limit) => {
                std::fs::write(dest, b"PK\x03\x04").unwrap();
                Ok(FetchOutcome::Downloaded {
                    path: dest.to_path_buf(),
                    bytes: 4,
                    rate_limit,
                })
            }
            Reply::RateLimited(status) => Ok(FetchOutcome::RateLimited(status)),
            Reply::Status(code) => Err(VsixError::http_status(url.as_str(), code)),
        }
    }
}

struct FakeInstaller {
    outcome: InstallOutcome,
    version: Option<CodeVersion>,
    installs: Mutex<Vec<(Utf8PathBuf, Channel)>>,
}

impl FakeInstaller {
    fn succeeding() -> Self {
        Self {
            outcome: InstallOutcome::Installed,
            version: Some(CodeVersion {
                version: "1.85.1".to_string(),
                commit: "abc123".to_string(),
            }),
            installs: Mutex::default(),
        }
    }

    fn failing() -> Self {
        Self {
            outcome: InstallOutcome::Failed {
                code: Some(1),
                message: "code exited with exit status: 1".to_string(),
            },
            ..Self::succeeding()
        }
    }

    fn installs(&self) -> Vec<(Utf8PathBuf, Channel)> {
        self.installs.lock().unwrap().clone()
    }
}

impl Installer for FakeInstaller {
    async fn install(&self, artifact: &Utf8Path, channel: Channel) -> InstallOutcome {
        self.installs
            .lock()
            .unwrap()
            .push((artifact.to_path_buf(), channel));
        self.outcome.clone()
    }

    async fn version_info(&self, channel: Channel) -> VsixResult<CodeVersion> {
        self.version.clone().ok_or_else(|| VsixError::Installer {
            command: format!("code ({})", channel),
            message: "not installed".to_string(),
            source: None,
        })
    }
}

fn root(temp_dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap()
}

fn settings(download_root: Utf8PathBuf) -> FetchSettings {
    FetchSettings {
        upstream: UpstreamName::Marketplace,
        upstreams: UpstreamTable::default(),
        identifier_format: IdentifierFormat::default(),
        download_root,
        download_only: false,
        channel: Channel::Stable,
        companion: Some(CompanionConfig {
            marker: "remote-ssh".to_string(),
            url_template: DEFAULT_COMPANION_URL.to_string(),
        }),
    }
}

fn tokens(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn started() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 1, 31, 9, 45, 2).single().unwrap()
}

fn reset_in(secs: i64) -> RateLimitStatus {
    RateLimitStatus {
        limit: Some(10),
        remaining: Some(0),
        reset_at: Some(Utc::now() + chrono::Duration::seconds(secs)),
    }
}

#[tokio::test]
async fn test_marketplace_single_item() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::default(),
        FakeInstaller::succeeding(),
    );

    let report = engine
        .run_started_at(tokens(&["acme.tool@1.0.0"]), started())
        .await
        .unwrap();

    let dir = root(&temp_dir).join("vsix-20240131-094502");
    let artifact = dir.join("acme.tool@1.0.0.vsix");
    assert_eq!(
        engine.fetcher().urls(),
        vec!["https://marketplace.visualstudio.com/_apis/public/gallery/publishers/acme/vsextensions/tool/1.0.0/vspackage"]
    );
    assert_eq!(engine.fetcher().dests(), vec![artifact.clone()]);
    assert_eq!(engine.installer().installs(), vec![(artifact.clone(), Channel::Stable)]);

    assert_eq!(report.download_dir, Some(dir));
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].artifact, artifact);
    assert_eq!(report.completed[0].install, Some(InstallOutcome::Installed));
    assert_eq!(report.rate_limit_retries, 0);
    assert!(artifact.is_file());
}

#[tokio::test]
async fn test_items_processed_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::default(),
        FakeInstaller::succeeding(),
    );

    let report = engine
        .run(tokens(&["a.one@1", "b.two@2.0", "c.three@3.0.1"]))
        .await
        .unwrap();

    let names: Vec<_> = report
        .completed
        .iter()
        .map(|item| item.identifier.name().to_string())
        .collect();
    assert_eq!(names, ["one", "two", "three"]);
    assert_eq!(engine.fetcher().urls().len(), 3);
    assert_eq!(report.total_bytes(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_first_rate_limit_waits_and_retries_same_head() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![Reply::RateLimited(reset_in(5))]),
        FakeInstaller::succeeding(),
    );

    let before = tokio::time::Instant::now();
    let report = engine
        .run(tokens(&["acme.tool@1.0.0", "acme.other@2.0.0"]))
        .await
        .unwrap();
    let waited = before.elapsed();

    assert!(waited >= std::time::Duration::from_secs(4), "waited {:?}", waited);
    assert!(waited <= std::time::Duration::from_secs(5), "waited {:?}", waited);

    let urls = engine.fetcher().urls();
    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], urls[1]);
    assert!(urls[2].contains("/other/"));
    assert_eq!(report.rate_limit_retries, 1);
    assert_eq!(report.completed.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_without_reset_retries_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![Reply::RateLimited(RateLimitStatus::default())]),
        FakeInstaller::succeeding(),
    );

    let before = tokio::time::Instant::now();
    let report = engine.run(tokens(&["acme.tool@1.0.0"])).await.unwrap();

    assert_eq!(before.elapsed(), std::time::Duration::ZERO);
    assert_eq!(engine.fetcher().urls().len(), 2);
    assert_eq!(report.completed.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_rate_limit_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![
            Reply::RateLimited(reset_in(1)),
            Reply::RateLimited(reset_in(1)),
        ]),
        FakeInstaller::succeeding(),
    );

    let err = engine
        .run(tokens(&["acme.tool@1.0.0", "acme.other@2.0.0"]))
        .await
        .unwrap_err();

    match err {
        VsixError::RateLimitExhausted { identifier, retries } => {
            assert_eq!(identifier, "acme.tool@1.0.0");
            assert_eq!(retries, 1);
        }
        other => panic!("expected RateLimitExhausted, got {:?}", other),
    }

    let urls = engine.fetcher().urls();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|url| url.contains("/tool/")));
    assert!(engine.installer().installs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_resets_for_next_item() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![
            Reply::RateLimited(RateLimitStatus::default()),
            Reply::Ok(RateLimitStatus::default()),
            Reply::RateLimited(RateLimitStatus::default()),
            Reply::Ok(RateLimitStatus::default()),
        ]),
        FakeInstaller::succeeding(),
    );

    let report = engine
        .run(tokens(&["acme.tool@1.0.0", "acme.other@2.0.0"]))
        .await
        .unwrap();

    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.rate_limit_retries, 2);
}

#[tokio::test]
async fn test_http_error_is_fatal_without_retry() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![Reply::Status(404)]),
        FakeInstaller::succeeding(),
    );

    let err = engine
        .run(tokens(&["acme.tool@1.0.0", "acme.other@2.0.0"]))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(engine.fetcher().urls().len(), 1);
}

#[tokio::test]
async fn test_alternate_separators_drain_queue() {
    for (format, token, file) in [
        (IdentifierFormat::dashed(), "acme.tool-1.0.0", "acme.tool-1.0.0.vsix"),
        (IdentifierFormat::new('+', '#').unwrap(), "acme+tool#1.0.0", "acme+tool#1.0.0.vsix"),
    ] {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = settings(root(&temp_dir));
        settings.identifier_format = format;
        let engine = Engine::new(settings, FakeFetcher::default(), FakeInstaller::succeeding());

        let report = engine
            .run_started_at(tokens(&[token]), started())
            .await
            .unwrap();

        let artifact = root(&temp_dir).join("vsix-20240131-094502").join(file);
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].artifact, artifact);
        assert!(artifact.is_file());
        assert!(engine.fetcher().urls()[0].contains("/acme/vsextensions/tool/1.0.0/"));
    }
}

#[tokio::test]
async fn test_download_only_skips_installer() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(root(&temp_dir));
    settings.download_only = true;
    let engine = Engine::new(settings, FakeFetcher::default(), FakeInstaller::succeeding());

    let report = engine.run(tokens(&["acme.tool@1.0.0"])).await.unwrap();

    assert!(engine.installer().installs().is_empty());
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].install, None);
}

#[tokio::test]
async fn test_installer_failure_does_not_stop_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(root(&temp_dir));
    settings.channel = Channel::Insiders;
    let engine = Engine::new(settings, FakeFetcher::default(), FakeInstaller::failing());

    let report = engine
        .run(tokens(&["acme.tool@1.0.0", "acme.other@2.0.0"]))
        .await
        .unwrap();

    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed_installs().count(), 2);
    let installs = engine.installer().installs();
    assert_eq!(installs.len(), 2);
    assert!(installs.iter().all(|(_, channel)| *channel == Channel::Insiders));
}

#[tokio::test]
async fn test_malformed_identifier_aborts_before_fetch() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::default(),
        FakeInstaller::succeeding(),
    );

    let err = engine
        .run(tokens(&["acme.tool@1.0.0", "not a token", "acme.other@2.0.0"]))
        .await
        .unwrap_err();

    assert!(matches!(err, VsixError::MalformedIdentifier { token, .. } if token == "not a token"));
    assert_eq!(engine.fetcher().urls().len(), 1);
}

#[tokio::test]
async fn test_empty_queue_creates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::default(),
        FakeInstaller::succeeding(),
    );

    let report = engine.run(Vec::new()).await.unwrap();

    assert_eq!(report, RunReport::default());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    assert!(engine.fetcher().urls().is_empty());
}

#[tokio::test]
async fn test_companion_bundle_downloaded_after_trigger() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::default(),
        FakeInstaller::succeeding(),
    );

    let report = engine
        .run_started_at(tokens(&["ms-vscode-remote.remote-ssh@0.107.1"]), started())
        .await
        .unwrap();

    let urls = engine.fetcher().urls();
    assert_eq!(urls.len(), 2);
    assert_eq!(
        urls[1],
        "https://update.code.visualstudio.com/commit:abc123/server-linux-x64/stable"
    );

    let dir = root(&temp_dir).join("vsix-20240131-094502");
    assert_eq!(
        report.companion_bundles,
        vec![CompanionBundle {
            version: "1.85.1".to_string(),
            commit: "abc123".to_string(),
            path: dir.join("vscode-server-1.85.1.tar.gz"),
        }]
    );
}

#[tokio::test]
async fn test_companion_runs_in_download_only_mode() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(root(&temp_dir));
    settings.download_only = true;
    let engine = Engine::new(settings, FakeFetcher::default(), FakeInstaller::succeeding());

    let report = engine
        .run(tokens(&["ms-vscode-remote.remote-ssh@0.107.1"]))
        .await
        .unwrap();

    assert_eq!(report.companion_bundles.len(), 1);
    assert!(engine.installer().installs().is_empty());
}

#[tokio::test]
async fn test_companion_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(root(&temp_dir));
    settings.companion = None;
    let engine = Engine::new(settings, FakeFetcher::default(), FakeInstaller::succeeding());

    let report = engine
        .run(tokens(&["ms-vscode-remote.remote-ssh@0.107.1"]))
        .await
        .unwrap();

    assert!(report.companion_bundles.is_empty());
    assert_eq!(engine.fetcher().urls().len(), 1);
}

#[tokio::test]
async fn test_companion_rate_limit_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![
            Reply::Ok(RateLimitStatus::default()),
            Reply::RateLimited(RateLimitStatus::default()),
        ]),
        FakeInstaller::succeeding(),
    );

    let err = engine
        .run(tokens(&["ms-vscode-remote.remote-ssh@0.107.1"]))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_companion_version_query_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let installer = FakeInstaller {
        version: None,
        ..FakeInstaller::succeeding()
    };
    let engine = Engine::new(settings(root(&temp_dir)), FakeFetcher::default(), installer);

    let err = engine
        .run(tokens(&["ms-vscode-remote.remote-ssh@0.107.1", "acme.tool@1.0.0"]))
        .await
        .unwrap_err();

    assert!(matches!(err, VsixError::Installer { .. }));
    assert_eq!(engine.fetcher().urls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_depleted_window_throttles_next_item() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![Reply::Ok(reset_in(10))]),
        FakeInstaller::succeeding(),
    );

    let before = tokio::time::Instant::now();
    engine
        .run(tokens(&["acme.tool@1.0.0", "acme.other@2.0.0"]))
        .await
        .unwrap();

    assert!(before.elapsed() >= std::time::Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_depleted_window_on_last_item_does_not_wait() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::new(
        settings(root(&temp_dir)),
        FakeFetcher::with(vec![Reply::Ok(reset_in(10))]),
        FakeInstaller::succeeding(),
    );

    let before = tokio::time::Instant::now();
    engine.run(tokens(&["acme.tool@1.0.0"])).await.unwrap();

    assert_eq!(before.elapsed(), std::time::Duration::ZERO);
}

#[test]
fn test_plan_resolves_without_fetching() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(root(&temp_dir));
    settings.upstream = UpstreamName::Local;
    let engine = Engine::new(settings, FakeFetcher::default(), FakeInstaller::succeeding());

    let plan = engine.plan(&tokens(&["acme.tool@1.0.0"])).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].url.as_str(), "http://localhost:8000/acme.tool-1.0.0.vsix");
    assert!(engine.fetcher().urls().is_empty());

    assert!(engine.plan(&tokens(&["acme.tool@1.0.0", "acme"])).is_err());
}

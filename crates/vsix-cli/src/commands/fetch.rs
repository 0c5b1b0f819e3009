//! `vsix` fetch implementation.
//!
//! Loads configuration, builds the work queue from the list file and the
//! positional identifiers, then hands it to the engine.

use std::time::Instant;
use tracing::debug;
use vsix_config::{combine, read_list_file, ConfigLoader, VsixToml};
use vsix_core::error::VsixResult;
use vsix_core::Channel;
use vsix_installer::{CodeInstaller, Engine, FetchSettings, PlannedFetch, RunReport};
use vsix_registry::VsixClient;

use super::{CommandContext, FetchArgs};

/// What a fetch invocation produced
#[derive(Debug)]
pub enum FetchResult {
    /// `--dry-run`: resolved URLs only
    Planned(Vec<PlannedFetch>),
    Completed(RunReport),
}

/// Execute the fetch
pub async fn execute(args: FetchArgs, ctx: &CommandContext) -> VsixResult<FetchResult> {
    let start_time = Instant::now();

    let loader = ConfigLoader::new(ctx.cwd.clone()).with_global_dir(ctx.global_dir.clone());
    let (config, sources) = loader
        .load(args.config.as_deref(), &ctx.env, cli_layer(&args))
        .await?;
    debug!("Configuration sources: {:?}", sources);

    let list_tokens = match &args.file {
        Some(file) => read_list_file(&ctx.absolute(file)).await?,
        None => Vec::new(),
    };
    let tokens = combine(list_tokens, args.identifiers);

    let mut settings = FetchSettings::from_config(&config);
    settings.download_root = ctx.absolute(&settings.download_root);

    let client = VsixClient::new(&config.user_agent)?;
    debug!("User-Agent: {}", client.user_agent());
    let engine = Engine::new(
        settings,
        client,
        CodeInstaller::new(config.installer.clone()),
    );

    if args.dry_run {
        let plan = engine.plan(&tokens)?;
        for planned in &plan {
            ctx.output.step("→", &format!("{}  {}", planned.token, planned.url));
        }
        ctx.output.info(&format!("{} extension(s) would be downloaded", plan.len()));
        return Ok(FetchResult::Planned(plan));
    }

    if tokens.is_empty() {
        ctx.output.info("No extensions to install");
    } else {
        ctx.output.step(
            "📦",
            &format!(
                "Fetching {} extension(s) from {} for {}",
                tokens.len(),
                config.upstream,
                match (config.download_only, config.channel) {
                    (true, _) => "download only".to_string(),
                    (false, Channel::Stable) => format!("VS Code ({})", config.installer_command()),
                    (false, Channel::Insiders) => {
                        format!("VS Code Insiders ({})", config.installer_command())
                    }
                }
            ),
        );
    }

    let report = engine.run(tokens).await?;
    print_summary(&report, ctx);

    if !report.completed.is_empty() {
        ctx.output.success(&format!(
            "Processed {} extension(s), {} bytes in {:.2}s",
            report.completed.len(),
            report.total_bytes(),
            start_time.elapsed().as_secs_f64()
        ));
    }
    Ok(FetchResult::Completed(report))
}

/// Configuration layer carrying the command line flags
pub fn cli_layer(args: &FetchArgs) -> VsixToml {
    let mut layer = VsixToml::default();
    layer.fetch.upstream = args.upstream.clone();
    layer.fetch.download_dir = args.download_dir.clone();
    if args.insiders {
        layer.fetch.channel = Some(Channel::Insiders);
    }
    if args.download_only {
        layer.fetch.download_only = Some(true);
    }
    layer
}

fn print_summary(report: &RunReport, ctx: &CommandContext) {
    for item in &report.completed {
        ctx.output.info(&format!("{} ({} bytes)", item.artifact, item.bytes));
    }
    for item in report.failed_installs() {
        ctx.output.warn(&format!("{} was downloaded but not installed", item.identifier));
    }
    for bundle in &report.companion_bundles {
        ctx.output.info(&format!(
            "VS Code server {} ({}) saved to {}",
            bundle.version, bundle.commit, bundle.path
        ));
    }
    if report.rate_limit_retries > 0 {
        ctx.output.info(&format!(
            "Recovered from {} rate limit response(s)",
            report.rate_limit_retries
        ));
    }
}

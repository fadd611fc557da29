use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use prelaunch::core::auth::LaunchSession;
use prelaunch::core::platform::TargetOs;
use prelaunch::core::settings::{default_root_dir, PipelineSettings};
use prelaunch::{init_tracing, LaunchPipeline, LaunchPlan, LaunchRequest, LauncherResult};

/// Download everything a Minecraft version needs and print its launch plan
/// as JSON.
#[derive(Parser)]
#[command(name = "prelaunch", version)]
struct Cli {
    /// Version id from the version manifest, e.g. 1.12.2
    #[arg(value_name = "VERSION")]
    version_id: String,

    /// Launcher root holding libraries, assets, natives and versions
    #[arg(long)]
    root: Option<PathBuf>,

    /// Target platform: windows, osx or linux
    #[arg(long, default_value_t = TargetOs::current().as_str().to_string())]
    os: String,

    /// Offline player name
    #[arg(long, default_value = "Player")]
    username: String,

    /// Maximum concurrent downloads per batch
    #[arg(long)]
    concurrency: Option<usize>,

    /// Re-hash cached files instead of trusting their presence
    #[arg(long)]
    verify: bool,

    /// Write the effective settings back to the root
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(plan) if plan.failures.is_empty() => ExitCode::SUCCESS,
        Ok(plan) => {
            error!(
                "{} artifacts could not be prepared",
                plan.failures.total()
            );
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> LauncherResult<LaunchPlan> {
    let root = cli.root.unwrap_or_else(default_root_dir);

    let mut settings = PipelineSettings::load(&root);
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency = concurrency;
    }
    if cli.verify {
        settings.verify_cached = true;
    }
    if cli.save_settings {
        settings.save(&root)?;
    }

    let pipeline = LaunchPipeline::from_settings(root, settings)?;
    let request = LaunchRequest {
        version_id: cli.version_id,
        os: cli.os,
        session: LaunchSession::offline(&cli.username),
    };

    let plan = pipeline.prepare(&request).await?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(plan)
}

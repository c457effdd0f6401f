use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    let cli = obs_import::cli::Cli::parse();
    obs_import::logging::init(cli.quiet()).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        obs_import::cli::Command::Import(args) => {
            obs_import::import::run(args).await.context("import")?;
        }
        obs_import::cli::Command::Convert(args) => {
            obs_import::convert::run(args).context("convert")?;
        }
        obs_import::cli::Command::Verify(args) => {
            obs_import::verify::run(args).context("verify")?;
        }
        obs_import::cli::Command::Manifest {
            command: obs_import::cli::ManifestCommand::Upgrade(args),
        } => {
            obs_import::manifest::upgrade(args).context("manifest upgrade")?;
        }
    }

    Ok(())
}

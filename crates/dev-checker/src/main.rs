//! dev-checker: runs type checkers and linters beside a dev server.

mod cli;
mod config;
mod coordinator;
mod overlay;
mod protocol;
mod worker;

use clap::Parser;
use cli::Args;
use config::Settings;
use coordinator::Coordinator;
use miette::{IntoDiagnostic, Result};
use overlay::JsonLinesTransport;
use protocol::Mode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.no_color);

    let settings = Settings::resolve(&args).into_diagnostic()?;
    tracing::debug!(
        root = %settings.root,
        mode = ?settings.mode,
        checkers = settings.checkers.len(),
        "resolved settings"
    );

    let failed = match settings.mode {
        Mode::Build => run_build(&settings).await?,
        Mode::Serve => run_serve(&settings).await?,
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn,mio=warn"))
    });

    let use_ansi = !no_color && std::env::var_os("NO_COLOR").is_none();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Checks once; returns true if the process should fail.
async fn run_build(settings: &Settings) -> Result<bool> {
    if !settings.enable_build {
        tracing::info!("checks are disabled for builds");
        return Ok(false);
    }

    let coordinator = Coordinator::spawn(settings).into_diagnostic()?;
    let outcome = coordinator.run_build(&mut std::io::stdout()).await;
    Ok(outcome.is_failure(settings.fail_on_warnings))
}

/// Checks and watches until interrupted; returns true if a checker failed.
async fn run_serve(settings: &Settings) -> Result<bool> {
    let coordinator = Coordinator::spawn(settings).into_diagnostic()?;

    let mut transport = settings
        .overlay
        .then(|| JsonLinesTransport::create(&settings.overlay_file));
    if let Some(transport) = &transport {
        tracing::info!(path = %transport.path(), "writing overlay payloads");
    }

    coordinator.configure_server(&settings.root);

    let mut stdout = std::io::stdout();
    tokio::select! {
        failed = coordinator.serve(&mut stdout, &mut transport) => Ok(!failed.is_empty()),
        result = tokio::signal::ctrl_c() => {
            result.into_diagnostic()?;
            tracing::info!("stopping");
            Ok(false)
        }
    }
}

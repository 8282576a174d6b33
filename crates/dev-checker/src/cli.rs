//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::Parser;

/// Runs type checkers and linters beside a dev server.
#[derive(Debug, Parser)]
#[command(name = "dev-checker")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: Utf8PathBuf,

    /// Path to the config file (default: <root>/dev-checker.json)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Keep checking on file changes instead of checking once
    #[arg(long)]
    pub watch: bool,

    /// Don't write overlay payloads
    #[arg(long = "no-overlay")]
    pub no_overlay: bool,

    /// Don't print diagnostics to the terminal
    #[arg(long = "no-terminal")]
    pub no_terminal: bool,

    /// Where overlay payloads are written (one JSON object per line)
    #[arg(long = "overlay-file")]
    pub overlay_file: Option<Utf8PathBuf>,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Exit with error on warnings
    #[arg(long = "fail-on-warnings")]
    pub fail_on_warnings: bool,

    /// Log debug output
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Enable the TypeScript checker with its default command
    #[arg(long)]
    pub typescript: bool,

    /// Enable ESLint with this command (e.g. "eslint ./src")
    #[arg(long, value_name = "CMD")]
    pub eslint: Option<String>,

    /// Enable Stylelint with this command (e.g. "stylelint ./src/**/*.css")
    #[arg(long, value_name = "CMD")]
    pub stylelint: Option<String>,

    /// Enable a language server checker with this command
    #[arg(long, value_name = "CMD")]
    pub lsp: Option<String>,
}

impl Args {
    /// Returns whether terminal output should use ANSI colors.
    pub fn color(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }
}

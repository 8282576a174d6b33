//! Configuration loading.
//!
//! Settings come from `dev-checker.json` (JSON with comments) at the project
//! root, overridden by command line flags.

use crate::cli::Args;
use crate::protocol::Mode;
use camino::{Utf8Path, Utf8PathBuf};
use checker_diagnostics::Severity;
use checker_runner::{CheckerError, CheckerKind, ProcessChecker};
use serde::Deserialize;
use std::fs;

/// Name of the config file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "dev-checker.json";

/// Overlay file location relative to the project root.
const DEFAULT_OVERLAY_FILE: &str = "node_modules/.cache/dev-checker/overlay.jsonl";

/// Error types for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The project root could not be resolved.
    #[error("project root `{path}` is not accessible: {source}")]
    Root {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A checker command could not be parsed.
    #[error(transparent)]
    Checker(#[from] CheckerError),

    /// Neither the config file nor the flags enable a checker.
    #[error("no checkers enabled; pass e.g. --eslint or --typescript, or add dev-checker.json")]
    NoCheckers,
}

/// Contents of `dev-checker.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Write overlay payloads (default: true).
    pub overlay: Option<bool>,
    /// Print diagnostics to the terminal (default: true).
    pub terminal: Option<bool>,
    /// Run the checkers in build mode (default: true).
    pub enable_build: Option<bool>,
    pub typescript: Option<CheckerEntry>,
    pub eslint: Option<CheckerEntry>,
    pub stylelint: Option<CheckerEntry>,
    pub lsp: Option<CheckerEntry>,
}

/// A checker entry: `true`/`false`, or its options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CheckerEntry {
    Enabled(bool),
    Options(CheckerOptions),
}

impl CheckerEntry {
    /// Returns the options of an enabled entry.
    fn options(&self) -> Option<CheckerOptions> {
        match self {
            CheckerEntry::Enabled(true) => Some(CheckerOptions::default()),
            CheckerEntry::Enabled(false) => None,
            CheckerEntry::Options(options) => Some(options.clone()),
        }
    }
}

/// Options of one checker.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerOptions {
    /// Command line; the kind's default command when absent.
    pub command: Option<String>,
    /// Paths or globs the watcher reacts to.
    pub watch_path: Option<WatchPath>,
    /// Serve-mode options.
    #[serde(default)]
    pub dev: DevOptions,
}

/// One watch path or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WatchPath {
    One(String),
    Many(Vec<String>),
}

impl WatchPath {
    fn into_vec(self) -> Vec<String> {
        match self {
            WatchPath::One(path) => vec![path],
            WatchPath::Many(paths) => paths,
        }
    }
}

/// Options that only apply in serve mode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevOptions {
    /// Reported severities; every level when absent.
    pub log_level: Option<Vec<Severity>>,
    /// Extra arguments appended to the command.
    pub override_args: Option<String>,
}

impl FileConfig {
    /// Loads and parses a config file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parses config text; `path` is only used in errors.
    pub fn parse(content: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = remove_json_comments(content);
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    fn entry(&self, kind: CheckerKind) -> Option<&CheckerEntry> {
        match kind {
            CheckerKind::Compiler => self.typescript.as_ref(),
            CheckerKind::LintRule => self.eslint.as_ref(),
            CheckerKind::StyleRule => self.stylelint.as_ref(),
            CheckerKind::LanguageServer => self.lsp.as_ref(),
        }
    }
}

/// One enabled checker, ready to run.
#[derive(Debug, Clone)]
pub struct CheckerSettings {
    pub runner: ProcessChecker,
    /// Patterns the watcher reacts to, relative to the root.
    pub watch_paths: Vec<String>,
    /// Reported severities; `None` reports every level.
    pub log_level: Option<Vec<Severity>>,
}

impl CheckerSettings {
    fn new(kind: CheckerKind, options: CheckerOptions, mode: Mode) -> Result<Self, ConfigError> {
        let base = options
            .command
            .as_deref()
            .or(kind.default_command())
            .ok_or(CheckerError::MissingCommand(kind.name()))?;

        let command = match (mode, options.dev.override_args.as_deref()) {
            (Mode::Serve, Some(extra)) if !extra.trim().is_empty() => format!("{base} {extra}"),
            _ => base.to_string(),
        };

        let runner = ProcessChecker::from_command(kind, Some(&command))?;

        let watch_paths = match options.watch_path {
            Some(paths) => paths.into_vec(),
            None => {
                let operands = runner.command().file_operands();
                if operands.is_empty() {
                    vec![".".to_string()]
                } else {
                    operands.into_iter().map(str::to_string).collect()
                }
            }
        };

        Ok(Self {
            runner,
            watch_paths,
            log_level: options.dev.log_level,
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Canonical project root.
    pub root: Utf8PathBuf,
    pub mode: Mode,
    pub overlay: bool,
    pub terminal: bool,
    pub enable_build: bool,
    pub color: bool,
    pub fail_on_warnings: bool,
    pub overlay_file: Utf8PathBuf,
    /// Globs no checker reacts to.
    pub ignore: Vec<String>,
    pub checkers: Vec<CheckerSettings>,
}

impl Settings {
    /// Resolves the settings for `args`, reading the config file if present.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let root = args
            .root
            .canonicalize_utf8()
            .map_err(|source| ConfigError::Root {
                path: args.root.clone(),
                source,
            })?;

        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => {
                let path = root.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    FileConfig::load(&path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Self::from_parts(args, root, file)
    }

    /// Merges `file` with `args`; flags win.
    fn from_parts(args: &Args, root: Utf8PathBuf, file: FileConfig) -> Result<Self, ConfigError> {
        let mode = if args.watch { Mode::Serve } else { Mode::Build };

        let checkers = CheckerKind::ALL
            .into_iter()
            .filter_map(|kind| merged_options(kind, &file, args).map(|options| (kind, options)))
            .map(|(kind, options)| CheckerSettings::new(kind, options, mode))
            .collect::<Result<Vec<_>, _>>()?;

        if checkers.is_empty() {
            return Err(ConfigError::NoCheckers);
        }

        let overlay_file = args
            .overlay_file
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_OVERLAY_FILE));

        Ok(Self {
            mode,
            overlay: !args.no_overlay && file.overlay.unwrap_or(true),
            terminal: !args.no_terminal && file.terminal.unwrap_or(true),
            enable_build: file.enable_build.unwrap_or(true),
            color: args.color(),
            fail_on_warnings: args.fail_on_warnings,
            overlay_file,
            ignore: args.ignore.clone(),
            checkers,
            root,
        })
    }
}

/// Returns the command a flag sets for `kind`: `None` when the flag is
/// absent, `Some(None)` to enable the kind with its configured command.
fn cli_command(kind: CheckerKind, args: &Args) -> Option<Option<&str>> {
    match kind {
        CheckerKind::Compiler => args.typescript.then_some(None),
        CheckerKind::LintRule => args.eslint.as_deref().map(Some),
        CheckerKind::StyleRule => args.stylelint.as_deref().map(Some),
        CheckerKind::LanguageServer => args.lsp.as_deref().map(Some),
    }
}

fn merged_options(kind: CheckerKind, file: &FileConfig, args: &Args) -> Option<CheckerOptions> {
    let from_file = file.entry(kind).and_then(CheckerEntry::options);
    match cli_command(kind, args) {
        None => from_file,
        Some(command) => {
            let mut options = from_file.unwrap_or_default();
            if let Some(command) = command {
                options.command = Some(command.to_string());
            }
            Some(options)
        }
    }
}

/// Removes `//` and `/* */` comments outside of strings.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    while chars.peek().is_some_and(|&next| next != '\n') {
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

//! Checker process runner.

use crate::command::LintCommand;
use crate::parser::parse_tsc_output;
use camino::Utf8Path;
use checker_diagnostics::{
    CheckerName, LintResult, NativeDiagnostic, PublishDiagnosticsParams, StyleResult,
};
use std::future::Future;
use std::process::{Output, Stdio};
use thiserror::Error;
use tokio::process::Command;

/// Error types for checker invocation.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// Failed to spawn the checker process.
    #[error("failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The checker exited with a status that signals a failed run.
    #[error("`{program}` exited with code {code}: {stderr}")]
    ProcessFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The checker's output could not be parsed.
    #[error("failed to parse {checker} output: {message}")]
    ParseFailed {
        checker: CheckerName,
        message: String,
    },

    /// The command string could not be split into program and arguments.
    #[error("invalid command `{0}`: {1}")]
    InvalidCommand(String, String),

    /// The checker kind has no default command and none was configured.
    #[error("no command configured for {0}")]
    MissingCommand(CheckerName),
}

/// The kind of external checker, one per native diagnostic shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckerKind {
    /// The TypeScript compiler.
    Compiler,
    /// ESLint.
    LintRule,
    /// Stylelint.
    StyleRule,
    /// A command printing `textDocument/publishDiagnostics` params.
    LanguageServer,
}

impl CheckerKind {
    /// Every kind, in reporting order.
    pub const ALL: [CheckerKind; 4] = [
        CheckerKind::Compiler,
        CheckerKind::LintRule,
        CheckerKind::StyleRule,
        CheckerKind::LanguageServer,
    ];

    /// Returns the display name of the checker.
    pub fn name(self) -> CheckerName {
        match self {
            CheckerKind::Compiler => CheckerName::TypeScript,
            CheckerKind::LintRule => CheckerName::ESLint,
            CheckerKind::StyleRule => CheckerName::Stylelint,
            CheckerKind::LanguageServer => CheckerName::Lsp,
        }
    }

    /// Returns the command run when none is configured.
    pub fn default_command(self) -> Option<&'static str> {
        match self {
            CheckerKind::Compiler => Some("tsc --noEmit"),
            CheckerKind::LintRule => Some("eslint ."),
            CheckerKind::StyleRule => Some(r#"stylelint "**/*.css""#),
            CheckerKind::LanguageServer => None,
        }
    }

    /// Returns the option that selects machine-readable output.
    fn output_option(self) -> Option<(&'static str, &'static str)> {
        match self {
            CheckerKind::Compiler => Some(("--pretty", "false")),
            CheckerKind::LintRule => Some(("--format", "json")),
            CheckerKind::StyleRule => Some(("--formatter", "json")),
            CheckerKind::LanguageServer => None,
        }
    }
}

/// Runs a checker over a whole project or a single file.
pub trait CheckRunner: Send + Sync {
    /// Returns the name of the checker.
    fn name(&self) -> CheckerName;

    /// Checks every file of the project rooted at `root`.
    fn check_project(
        &self,
        root: &Utf8Path,
    ) -> impl Future<Output = Result<Vec<NativeDiagnostic>, CheckerError>> + Send;

    /// Checks a single file of the project rooted at `root`, returning only
    /// that file's records.
    fn check_file(
        &self,
        root: &Utf8Path,
        file: &Utf8Path,
    ) -> impl Future<Output = Result<Vec<NativeDiagnostic>, CheckerError>> + Send;
}

/// A [`CheckRunner`] that spawns the checker as an external process.
#[derive(Debug, Clone)]
pub struct ProcessChecker {
    kind: CheckerKind,
    command: LintCommand,
}

impl ProcessChecker {
    /// Creates a runner for `command`, adding the kind's output option.
    pub fn new(kind: CheckerKind, command: LintCommand) -> Self {
        let command = match kind.output_option() {
            Some((option, value)) => command.ensure_option(option, value),
            None => command,
        };
        Self { kind, command }
    }

    /// Creates a runner from a command string, or the kind's default command.
    pub fn from_command(kind: CheckerKind, command: Option<&str>) -> Result<Self, CheckerError> {
        let command = command
            .or(kind.default_command())
            .ok_or(CheckerError::MissingCommand(kind.name()))?;
        Ok(Self::new(kind, LintCommand::parse(command)?))
    }

    /// Creates a runner for the kind's default command.
    pub fn with_default_command(kind: CheckerKind) -> Result<Self, CheckerError> {
        Self::from_command(kind, None)
    }

    /// Returns the checker kind.
    pub fn kind(&self) -> CheckerKind {
        self.kind
    }

    /// Returns the command line.
    pub fn command(&self) -> &LintCommand {
        &self.command
    }

    async fn run(&self, root: &Utf8Path, command: &LintCommand) -> Result<Output, CheckerError> {
        let program = command.resolve_program(root);
        tracing::debug!(
            checker = %self.kind.name(),
            %program,
            command = %command,
            "running checker"
        );

        Command::new(&program)
            .args(command.args())
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CheckerError::SpawnFailed {
                program: program.to_string(),
                source,
            })
    }

    async fn check(
        &self,
        root: &Utf8Path,
        command: &LintCommand,
    ) -> Result<Vec<NativeDiagnostic>, CheckerError> {
        let output = self.run(root, command).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code().unwrap_or(-1);

        let failed = || CheckerError::ProcessFailed {
            program: command.program().to_string(),
            code,
            stderr: stderr.trim().to_string(),
        };

        let records: Vec<NativeDiagnostic> = match self.kind {
            CheckerKind::Compiler => {
                let diagnostics = parse_tsc_output(&stdout, root);
                // tsc exits non-zero on type errors, which is expected
                if !output.status.success()
                    && diagnostics.is_empty()
                    && !stderr.trim().is_empty()
                {
                    return Err(failed());
                }
                diagnostics
                    .into_iter()
                    .map(NativeDiagnostic::Compiler)
                    .collect()
            }
            CheckerKind::LintRule => {
                // 0: clean, 1: lint errors, 2: configuration or internal error
                if !matches!(code, 0 | 1) {
                    return Err(failed());
                }
                parse_json_array::<LintResult>(&stdout, self.kind)?
                    .into_iter()
                    .map(NativeDiagnostic::LintRule)
                    .collect()
            }
            CheckerKind::StyleRule => {
                // 0: clean, 2: lint problems
                if !matches!(code, 0 | 2) {
                    return Err(failed());
                }
                let report = if stdout.trim().is_empty() {
                    &stderr
                } else {
                    &stdout
                };
                parse_json_array::<StyleResult>(report, self.kind)?
                    .into_iter()
                    .map(|mut result| {
                        result.css = result
                            .source
                            .as_deref()
                            .and_then(|source| std::fs::read_to_string(source).ok());
                        NativeDiagnostic::StyleRule(result)
                    })
                    .collect()
            }
            CheckerKind::LanguageServer => {
                if !output.status.success() && stdout.trim().is_empty() {
                    return Err(failed());
                }
                parse_publish_params(&stdout)?
                    .into_iter()
                    .map(NativeDiagnostic::LanguageServer)
                    .collect()
            }
        };

        tracing::debug!(
            checker = %self.kind.name(),
            code,
            records = records.len(),
            "checker finished"
        );
        Ok(records)
    }
}

impl CheckRunner for ProcessChecker {
    fn name(&self) -> CheckerName {
        self.kind.name()
    }

    async fn check_project(&self, root: &Utf8Path) -> Result<Vec<NativeDiagnostic>, CheckerError> {
        self.check(root, &self.command).await
    }

    async fn check_file(
        &self,
        root: &Utf8Path,
        file: &Utf8Path,
    ) -> Result<Vec<NativeDiagnostic>, CheckerError> {
        let mut records = match self.kind {
            // tsc has no single-file mode that honors the project configuration
            CheckerKind::Compiler => self.check(root, &self.command).await?,
            _ => self.check(root, &self.command.for_file(file)).await?,
        };
        // Commands may report more files than the one asked for.
        records.retain(|record| is_record_for(record, file));
        Ok(records)
    }
}

fn is_record_for(record: &NativeDiagnostic, file: &Utf8Path) -> bool {
    match record {
        NativeDiagnostic::LanguageServer(params) => url::Url::parse(&params.uri)
            .ok()
            .and_then(|uri| uri.to_file_path().ok())
            .is_some_and(|path| path == file.as_std_path()),
        other => other.file_id() == Some(file.as_str()),
    }
}

fn parse_json_array<T: serde::de::DeserializeOwned>(
    text: &str,
    kind: CheckerKind,
) -> Result<Vec<T>, CheckerError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text.trim()).map_err(|e| CheckerError::ParseFailed {
        checker: kind.name(),
        message: e.to_string(),
    })
}

/// Parses a JSON array of params, or one params object per line.
fn parse_publish_params(text: &str) -> Result<Vec<PublishDiagnosticsParams>, CheckerError> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return parse_json_array(trimmed, CheckerKind::LanguageServer);
    }

    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| CheckerError::ParseFailed {
                checker: CheckerName::Lsp,
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_option_is_added() {
        let checker =
            ProcessChecker::from_command(CheckerKind::LintRule, Some("eslint src")).unwrap();
        assert_eq!(checker.command().to_string(), "eslint src --format json");

        let checker = ProcessChecker::with_default_command(CheckerKind::Compiler).unwrap();
        assert_eq!(checker.command().to_string(), "tsc --noEmit --pretty false");
    }

    #[test]
    fn test_language_server_requires_command() {
        assert!(matches!(
            ProcessChecker::with_default_command(CheckerKind::LanguageServer),
            Err(CheckerError::MissingCommand(CheckerName::Lsp))
        ));
    }

    #[test]
    fn test_parse_publish_params_lines_and_array() {
        let line = r#"{"uri":"file:///app/a.vue","diagnostics":[]}"#;
        let lines = format!("{line}\n\n{line}\n");
        assert_eq!(parse_publish_params(&lines).unwrap().len(), 2);

        let array = format!("[{line}]");
        assert_eq!(parse_publish_params(&array).unwrap().len(), 1);

        assert!(parse_publish_params("").unwrap().is_empty());
        assert!(matches!(
            parse_publish_params("not json"),
            Err(CheckerError::ParseFailed { .. })
        ));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use camino::Utf8PathBuf;
        use pretty_assertions::assert_eq;
        use std::os::unix::fs::PermissionsExt;

        fn fake_bin(root: &Utf8Path, name: &str, script: &str) {
            let bin = root.join("node_modules/.bin");
            std::fs::create_dir_all(&bin).unwrap();
            let path = bin.join(name);
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn project() -> (tempfile::TempDir, Utf8PathBuf) {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            (dir, root)
        }

        #[tokio::test]
        async fn test_lint_exit_one_is_success() {
            let (_dir, root) = project();
            fake_bin(
                &root,
                "fake-eslint",
                r#"#!/bin/sh
cat <<'EOF'
[{"filePath":"/app/a.js","messages":[{"ruleId":"semi","severity":2,"message":"Missing semicolon.","line":1,"column":10}]}]
EOF
exit 1
"#,
            );

            let checker =
                ProcessChecker::from_command(CheckerKind::LintRule, Some("fake-eslint .")).unwrap();
            let records = checker.check_project(&root).await.unwrap();

            assert_eq!(records.len(), 1);
            assert_eq!(records[0].file_id(), Some("/app/a.js"));
        }

        #[tokio::test]
        async fn test_lint_exit_two_is_failure() {
            let (_dir, root) = project();
            fake_bin(
                &root,
                "fake-eslint",
                "#!/bin/sh\necho 'Oops! Something went wrong!' >&2\nexit 2\n",
            );

            let checker =
                ProcessChecker::from_command(CheckerKind::LintRule, Some("fake-eslint .")).unwrap();
            let err = checker.check_project(&root).await.unwrap_err();

            assert!(matches!(err, CheckerError::ProcessFailed { code: 2, .. }));
            assert!(err.to_string().contains("Something went wrong"));
        }

        #[tokio::test]
        async fn test_style_reads_stderr_and_file_text() {
            let (_dir, root) = project();
            let css = root.join("a.css");
            std::fs::write(&css, "a {}\n").unwrap();
            fake_bin(
                &root,
                "fake-stylelint",
                &format!(
                    "#!/bin/sh\necho '[{{\"source\":\"{css}\",\"warnings\":[]}}]' >&2\nexit 2\n"
                ),
            );

            let checker =
                ProcessChecker::from_command(CheckerKind::StyleRule, Some("fake-stylelint a.css"))
                    .unwrap();
            let records = checker.check_project(&root).await.unwrap();

            match &records[..] {
                [NativeDiagnostic::StyleRule(result)] => {
                    assert_eq!(result.css.as_deref(), Some("a {}\n"));
                }
                other => panic!("unexpected records: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_check_file_passes_the_file() {
            let (_dir, root) = project();
            // Echoes its last argument back as the linted file.
            fake_bin(
                &root,
                "fake-eslint",
                r#"#!/bin/sh
for last; do :; done
printf '[{"filePath":"%s","messages":[]}]' "$last"
"#,
            );

            let checker =
                ProcessChecker::from_command(CheckerKind::LintRule, Some("fake-eslint src")).unwrap();
            let file = root.join("src/b.js");
            let records = checker.check_file(&root, &file).await.unwrap();

            assert_eq!(records[0].file_id(), Some(file.as_str()));
        }

        #[tokio::test]
        async fn test_check_file_keeps_only_that_file() {
            let (_dir, root) = project();
            let file = root.join("a.ts");
            let other = root.join("other.ts");
            fake_bin(
                &root,
                "fake-ls",
                &format!(
                    "#!/bin/sh\necho '{{\"uri\":\"file://{file}\",\"diagnostics\":[]}}'\necho '{{\"uri\":\"file://{other}\",\"diagnostics\":[]}}'\n"
                ),
            );

            let checker =
                ProcessChecker::from_command(CheckerKind::LanguageServer, Some("fake-ls")).unwrap();

            assert_eq!(checker.check_project(&root).await.unwrap().len(), 2);

            let records = checker.check_file(&root, &file).await.unwrap();
            assert_eq!(records.len(), 1);
            let expected = format!("file://{file}");
            assert_eq!(records[0].file_id(), Some(expected.as_str()));
        }

        #[tokio::test]
        async fn test_spawn_failure() {
            let (_dir, root) = project();
            let checker = ProcessChecker::from_command(
                CheckerKind::LanguageServer,
                Some("definitely-not-a-real-checker-binary"),
            )
            .unwrap();

            let err = checker.check_project(&root).await.unwrap_err();
            assert!(matches!(err, CheckerError::SpawnFailed { .. }));
        }
    }
}

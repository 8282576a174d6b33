//! Checker command lines.

use crate::runner::CheckerError;
use camino::{Utf8Path, Utf8PathBuf};

/// Options whose next argument is a value, not a file operand.
const VALUE_OPTIONS: &[&str] = &[
    "-c",
    "-f",
    "-p",
    "--config",
    "--config-basedir",
    "--custom-syntax",
    "--ext",
    "--format",
    "--formatter",
    "--ignore-path",
    "--ignore-pattern",
    "--max-warnings",
    "--parser",
    "--pretty",
    "--project",
    "--resolve-plugins-relative-to",
    "--rule",
];

/// A checker command line split into program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintCommand {
    program: String,
    args: Vec<String>,
}

impl LintCommand {
    /// Parses a command string such as `eslint --ext .ts src`.
    ///
    /// `~` and `$VAR` are expanded first, then the string is split with shell
    /// quoting rules.
    pub fn parse(command: &str) -> Result<Self, CheckerError> {
        let expanded = shellexpand::full(command)
            .map_err(|e| CheckerError::InvalidCommand(command.to_string(), e.to_string()))?;
        let mut words = shell_words::split(&expanded)
            .map_err(|e| CheckerError::InvalidCommand(command.to_string(), e.to_string()))?
            .into_iter();

        let program = words
            .next()
            .ok_or_else(|| CheckerError::InvalidCommand(command.to_string(), "empty".into()))?;

        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Returns the program as written.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the positional file or glob operands.
    pub fn file_operands(&self) -> Vec<&str> {
        self.operand_indices()
            .into_iter()
            .map(|i| self.args[i].as_str())
            .collect()
    }

    /// Sets `option` to `value`, replacing an existing value.
    pub fn ensure_option(mut self, option: &str, value: &str) -> Self {
        match self.args.iter().position(|a| a == option) {
            Some(i) if i + 1 < self.args.len() => self.args[i + 1] = value.to_string(),
            Some(_) => self.args.push(value.to_string()),
            None => {
                self.args.push(option.to_string());
                self.args.push(value.to_string());
            }
        }
        self
    }

    /// Returns the command with its file operands replaced by `file`.
    pub fn for_file(&self, file: &Utf8Path) -> Self {
        let operands = self.operand_indices();
        let mut args: Vec<String> = self
            .args
            .iter()
            .enumerate()
            .filter(|(i, _)| !operands.contains(i))
            .map(|(_, a)| a.clone())
            .collect();
        args.push(file.to_string());

        Self {
            program: self.program.clone(),
            args,
        }
    }

    /// Resolves the program to run.
    ///
    /// Search order:
    /// 1. `<root>/node_modules/.bin/<program>`
    /// 2. System PATH
    ///
    /// Falls back to the program as written.
    pub fn resolve_program(&self, root: &Utf8Path) -> Utf8PathBuf {
        let local = root.join("node_modules/.bin").join(&self.program);
        if local.exists() {
            return local;
        }

        if let Ok(path) = which::which(&self.program) {
            if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                return utf8_path;
            }
        }

        Utf8PathBuf::from(&self.program)
    }

    fn operand_indices(&self) -> Vec<usize> {
        let mut operands = Vec::new();
        let mut skip_value = false;

        for (i, arg) in self.args.iter().enumerate() {
            if skip_value {
                skip_value = false;
                continue;
            }
            if arg.starts_with('-') {
                skip_value = !arg.contains('=') && VALUE_OPTIONS.contains(&arg.as_str());
                continue;
            }
            operands.push(i);
        }

        operands
    }
}

impl std::fmt::Display for LintCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quoted_glob() {
        let command = LintCommand::parse(r#"stylelint "./**/*.css" --quiet"#).unwrap();
        assert_eq!(command.program(), "stylelint");
        assert_eq!(command.args(), ["./**/*.css", "--quiet"]);
    }

    #[test]
    fn test_parse_empty_command() {
        assert!(matches!(
            LintCommand::parse("   "),
            Err(CheckerError::InvalidCommand(_, _))
        ));
    }

    #[test]
    fn test_file_operands_skip_option_values() {
        let command = LintCommand::parse("eslint --ext .ts,.vue --max-warnings=0 src lib").unwrap();
        assert_eq!(command.file_operands(), vec!["src", "lib"]);
    }

    #[test]
    fn test_for_file_replaces_operands() {
        let command = LintCommand::parse("eslint --ext .ts src").unwrap();
        let single = command.for_file(Utf8Path::new("/app/src/a.ts"));
        assert_eq!(single.args(), ["--ext", ".ts", "/app/src/a.ts"]);
        assert_eq!(single.to_string(), "eslint --ext .ts /app/src/a.ts");
    }

    #[test]
    fn test_ensure_option_replaces_value() {
        let command = LintCommand::parse("eslint --format stylish .")
            .unwrap()
            .ensure_option("--format", "json");
        assert_eq!(command.args(), ["--format", "json", "."]);

        let appended = LintCommand::parse("stylelint a.css")
            .unwrap()
            .ensure_option("--formatter", "json");
        assert_eq!(appended.args(), ["a.css", "--formatter", "json"]);
    }

    #[test]
    fn test_resolve_prefers_local_bin() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let bin = root.join("node_modules/.bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("eslint"), "").unwrap();

        let command = LintCommand::parse("eslint .").unwrap();
        assert_eq!(command.resolve_program(root), bin.join("eslint"));
    }

    #[test]
    fn test_resolve_falls_back_to_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let command = LintCommand::parse("definitely-not-a-real-checker-binary").unwrap();
        assert_eq!(
            command.resolve_program(root),
            Utf8PathBuf::from("definitely-not-a-real-checker-binary")
        );
    }
}

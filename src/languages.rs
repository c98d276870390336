//! Language configuration for compilation and execution
//!
//! The set of supported languages is plain data: a TOML table mapping each
//! language to a source file name, an optional compile command and a run
//! command. Adding a language never touches control flow.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use crate::error::HarnessError;
use crate::runner::CommandSpec;
use crate::scratch::ScratchArtifact;

/// Built-in toolchain table
const BUILTIN_LANGUAGES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));

/// Configuration for a supported programming language
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    /// Canonical language name
    pub name: String,
    /// Name of the source file (e.g., "main.cpp")
    pub source_file: String,
    /// Compile command template (None if not needed)
    pub compile_command: Option<Vec<String>>,
    /// Run command template
    pub run_command: Vec<String>,
    /// Extra files to delete after the run, as templates
    pub cleanup: Vec<String>,
}

impl LanguageConfig {
    /// Source file extension, without the dot
    pub fn extension(&self) -> &str {
        Path::new(&self.source_file)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
    }

    /// Instantiate the command templates against a scratch directory.
    ///
    /// `{source}`, `{binary}` and `{dir}` are replaced by the scratch source
    /// path, executable path and directory. Every command runs with the
    /// scratch directory as its working directory.
    pub fn recipe(&self, scratch: &ScratchArtifact) -> Recipe {
        let expand = |template: &[String]| {
            let command: Vec<String> = template.iter().map(|arg| substitute(arg, scratch)).collect();
            CommandSpec::from_vec(&command).with_work_dir(scratch.dir())
        };

        let compile = self.compile_command.as_deref().map(expand);
        let run = expand(self.run_command.as_slice());

        let mut cleanup = vec![scratch.source_path().to_path_buf()];
        if compile.is_some() {
            cleanup.push(scratch.binary_path().to_path_buf());
        }
        cleanup.extend(
            self.cleanup
                .iter()
                .map(|template| PathBuf::from(substitute(template, scratch))),
        );

        Recipe {
            language: self.name.clone(),
            extension: self.extension().to_string(),
            source_path: scratch.source_path().to_path_buf(),
            compile,
            run,
            cleanup,
        }
    }
}

/// Concrete steps for one submission
#[derive(Debug, Clone)]
pub struct Recipe {
    pub language: String,
    pub extension: String,
    pub source_path: PathBuf,
    /// Must exit 0 before any test case runs
    pub compile: Option<CommandSpec>,
    /// Receives the test input on stdin
    pub run: CommandSpec,
    /// Scratch paths removed after the run
    pub cleanup: Vec<PathBuf>,
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    cleanup: Vec<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Mapping from language identifier (or alias) to its configuration
#[derive(Debug, Clone, Default)]
pub struct ToolchainTable {
    languages: HashMap<String, Arc<LanguageConfig>>,
}

impl ToolchainTable {
    /// Table compiled into the binary from `files/languages.toml`
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(BUILTIN_LANGUAGES).context("Invalid built-in language table")
    }

    /// Load a table from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language table {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid language table {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

        let mut table = Self::default();
        for (name, raw) in raw_configs {
            if raw.source_file.is_empty() || raw.source_file.contains('/') {
                anyhow::bail!("Invalid source_file for {}: {:?}", name, raw.source_file);
            }
            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                anyhow::bail!("Empty run_command for {}", name);
            }
            let compile_command = match raw.compile_command {
                Some(cmd) => {
                    let cmd = into_command(&cmd);
                    if cmd.is_empty() {
                        anyhow::bail!("Empty compile_command for {}", name);
                    }
                    Some(cmd)
                }
                None => None,
            };

            let config = LanguageConfig {
                name: name.to_lowercase(),
                source_file: raw.source_file,
                compile_command,
                run_command,
                cleanup: raw.cleanup,
            };
            table.insert(config, &raw.aliases)?;
        }

        Ok(table)
    }

    /// Register a language under its name and aliases
    pub fn insert(&mut self, config: LanguageConfig, aliases: &[String]) -> anyhow::Result<()> {
        let config = Arc::new(config);
        let keys = std::iter::once(&config.name).chain(aliases.iter());

        for key in keys {
            let key = key.trim().to_lowercase();
            if let Some(existing) = self.languages.get(&key) {
                anyhow::bail!(
                    "Language identifier {:?} used by both {} and {}",
                    key,
                    existing.name,
                    config.name
                );
            }
            self.languages.insert(key, Arc::clone(&config));
        }

        Ok(())
    }

    /// Get language configuration by language name or alias
    pub fn resolve(&self, language: &str) -> Result<&LanguageConfig, HarnessError> {
        self.languages
            .get(&language.trim().to_lowercase())
            .map(|config| config.as_ref())
            .ok_or_else(|| HarnessError::UnsupportedLanguage {
                language: language.to_string(),
            })
    }

    /// Canonical names of all supported languages, sorted
    pub fn supported_languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .languages
            .values()
            .map(|config| config.name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}

fn substitute(template: &str, scratch: &ScratchArtifact) -> String {
    template
        .replace("{source}", &scratch.source_path().to_string_lossy())
        .replace("{binary}", &scratch.binary_path().to_string_lossy())
        .replace("{dir}", &scratch.dir().to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch(source_file: &str) -> (tempfile::TempDir, ScratchArtifact) {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchArtifact::create(root.path(), source_file, "")
            .await
            .unwrap();
        (root, scratch)
    }

    #[test]
    fn test_builtin_languages() {
        let table = ToolchainTable::builtin().unwrap();
        assert_eq!(
            table.supported_languages(),
            vec!["c", "cpp", "java", "javascript", "python"]
        );
        assert_eq!(table.resolve("py").unwrap().name, "python");
        assert_eq!(table.resolve("C++").unwrap().name, "cpp");
        assert_eq!(table.resolve(" JavaScript ").unwrap().extension(), "js");
        assert!(table.resolve("java").unwrap().compile_command.is_some());
        assert!(table.resolve("python").unwrap().compile_command.is_none());
    }

    #[test]
    fn test_unsupported_language() {
        let table = ToolchainTable::builtin().unwrap();
        let err = table.resolve("cobol").unwrap_err();
        assert!(matches!(err, HarnessError::UnsupportedLanguage { ref language } if language == "cobol"));
        assert_eq!(err.to_string(), "Unsupported language");
    }

    #[tokio::test]
    async fn test_compiled_recipe() {
        let table = ToolchainTable::builtin().unwrap();
        let (_root, scratch) = scratch("main.cpp").await;
        let recipe = table.resolve("cpp").unwrap().recipe(&scratch);

        let source = scratch.source_path().to_string_lossy().into_owned();
        let binary = scratch.binary_path().to_string_lossy().into_owned();

        let compile = recipe.compile.expect("cpp has a compile step");
        assert_eq!(compile.program, "g++");
        assert!(compile.args.contains(&source));
        assert!(compile.args.contains(&binary));
        assert_eq!(compile.work_dir.as_deref(), Some(scratch.dir()));
        assert_eq!(recipe.run.program, binary);
        assert!(recipe.run.args.is_empty());
        assert_eq!(recipe.extension, "cpp");
        assert_eq!(
            recipe.cleanup,
            vec![scratch.source_path().to_path_buf(), scratch.binary_path().to_path_buf()]
        );
    }

    #[tokio::test]
    async fn test_interpreted_recipe() {
        let table = ToolchainTable::builtin().unwrap();
        let (_root, scratch) = scratch("main.py").await;
        let recipe = table.resolve("python").unwrap().recipe(&scratch);

        assert!(recipe.compile.is_none());
        assert_eq!(recipe.language, "python");
        assert_eq!(recipe.extension, "py");
        assert_eq!(recipe.source_path, scratch.source_path());
        assert_eq!(recipe.run.program, "python3");
        assert_eq!(
            recipe.run.args,
            vec![scratch.source_path().to_string_lossy().into_owned()]
        );
        assert_eq!(recipe.cleanup, vec![scratch.source_path().to_path_buf()]);
    }

    #[tokio::test]
    async fn test_extra_cleanup_targets() {
        let table = ToolchainTable::builtin().unwrap();
        let (_root, scratch) = scratch("Main.java").await;
        let recipe = table.resolve("java").unwrap().recipe(&scratch);

        assert!(recipe.cleanup.contains(&scratch.dir().join("Main.class")));
        let run = recipe.run.to_vec();
        assert_eq!(run.last().map(String::as_str), Some("Main"));
    }

    #[test]
    fn test_load_custom_table() {
        let table = ToolchainTable::from_toml_str(
            r#"
[c]
source_file = "main.c"
compile_command = "gcc -o {binary} {source}"
run_command = "{binary}"

[python]
source_file = "main.py"
run_command = "python3 {source}"
aliases = ["py", "python3"]
"#,
        )
        .unwrap();

        assert_eq!(table.supported_languages(), vec!["c", "python"]);
        assert_eq!(table.resolve("python3").unwrap().name, "python");
        assert!(table.resolve("javascript").is_err());
    }

    #[test]
    fn test_reject_invalid_tables() {
        let empty_run = r#"
[sh]
source_file = "main.sh"
run_command = "  "
"#;
        assert!(ToolchainTable::from_toml_str(empty_run).is_err());

        let alias_clash = r#"
[python]
source_file = "main.py"
run_command = "python3 {source}"
aliases = ["py"]

[pypy]
source_file = "main.py"
run_command = "pypy3 {source}"
aliases = ["py"]
"#;
        assert!(ToolchainTable::from_toml_str(alias_clash).is_err());

        let nested_source = r#"
[c]
source_file = "../main.c"
run_command = "{binary}"
"#;
        assert!(ToolchainTable::from_toml_str(nested_source).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[sh]\nsource_file = \"main.sh\"\nrun_command = \"sh {source}\"\n",
        )
        .unwrap();

        let table = ToolchainTable::from_file(file.path()).unwrap();
        assert_eq!(table.supported_languages(), vec!["sh"]);
    }
}

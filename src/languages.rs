//! Language registry: how each supported language is written to disk and run

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;

use crate::engine::EngineError;
use crate::runner::CommandSpec;

/// Languages the engine knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Go,
    Python,
    Shell,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Python => "python",
            Language::Shell => "shell",
        };
        write!(f, "{}", s)
    }
}

/// Configuration for a supported programming language
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    /// File extension without the dot (e.g., "js")
    pub extension: String,
    /// Command template; the source path is appended as the last argument
    pub command: Vec<String>,
}

impl LanguageConfig {
    /// Resolve the full invocation for a source file
    pub fn command_for(&self, source_path: &Path) -> CommandSpec {
        let mut command = self.command.clone();
        command.push(source_path.to_string_lossy().into_owned());
        CommandSpec::from_vec(&command)
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    extension: String,
    command: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Immutable table of language configurations and the names that select them
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    configs: HashMap<Language, LanguageConfig>,
    names: HashMap<String, Language>,
}

impl LanguageRegistry {
    /// Parse a registry from TOML, one table per language
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<Language, RawLanguageConfig> =
            toml::from_str(content).context("Invalid language table")?;

        let mut registry = Self::default();

        for (language, raw) in raw_configs {
            let extension = raw.extension.trim_start_matches('.').to_string();
            if extension.is_empty() {
                anyhow::bail!("Empty extension for {}", language);
            }

            let command = into_command(&raw.command);
            if command.is_empty() {
                anyhow::bail!("Empty command for {}", language);
            }

            registry.claim_name(&language.to_string(), language)?;
            for alias in &raw.aliases {
                registry.claim_name(alias, language)?;
            }

            registry
                .configs
                .insert(language, LanguageConfig { extension, command });
        }

        Ok(registry)
    }

    fn claim_name(&mut self, name: &str, language: Language) -> anyhow::Result<()> {
        let name = name.to_lowercase();
        match self.names.insert(name.clone(), language) {
            Some(previous) if previous != language => {
                anyhow::bail!("Name {:?} claimed by both {} and {}", name, previous, language)
            }
            _ => Ok(()),
        }
    }

    /// Get the configuration for a language
    pub fn lookup(&self, language: Language) -> Result<&LanguageConfig, EngineError> {
        self.configs
            .get(&language)
            .ok_or(EngineError::UnsupportedLanguage(language))
    }

    /// Map a request's language selector (name or alias) to a registered language
    pub fn resolve(&self, name: &str) -> Option<Language> {
        self.names.get(&name.trim().to_lowercase()).copied()
    }

    /// Get all registered languages
    pub fn supported(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.configs.keys().copied().collect();
        languages.sort();
        languages
    }
}

/// Global language configurations
static LANGUAGES: OnceLock<LanguageRegistry> = OnceLock::new();

/// Initialize the global registry from a TOML file, or the embedded table
pub fn init_languages(path: Option<&Path>) -> anyhow::Result<&'static LanguageRegistry> {
    if let Some(registry) = LANGUAGES.get() {
        return Ok(registry);
    }

    let registry = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read language table {}", path.display()))?;
            LanguageRegistry::from_toml(&content)?
        }
        None => LanguageRegistry::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/files/languages.toml"
        )))?,
    };

    Ok(LANGUAGES.get_or_init(|| registry))
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TEST_TABLE: &str = r#"
[javascript]
extension = "js"
command = "node"
aliases = ["js", "Node"]

[go]
extension = ".go"
command = "go   run"
"#;

    #[test]
    fn test_load_languages() {
        let registry = LanguageRegistry::from_toml(TEST_TABLE).unwrap();

        let js = registry.lookup(Language::JavaScript).unwrap();
        assert_eq!(js.extension, "js");
        assert_eq!(js.command, vec!["node"]);

        let go = registry.lookup(Language::Go).unwrap();
        assert_eq!(go.extension, "go");
        assert_eq!(go.command, vec!["go", "run"]);

        assert_eq!(
            registry.supported(),
            vec![Language::JavaScript, Language::Go]
        );
    }

    #[test]
    fn test_lookup_unmapped_language() {
        let registry = LanguageRegistry::from_toml(TEST_TABLE).unwrap();
        let err = registry.lookup(Language::Python).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedLanguage(Language::Python)));
    }

    #[test]
    fn test_resolve_names_and_aliases() {
        let registry = LanguageRegistry::from_toml(TEST_TABLE).unwrap();
        assert_eq!(registry.resolve("js"), Some(Language::JavaScript));
        assert_eq!(registry.resolve("NODE"), Some(Language::JavaScript));
        assert_eq!(registry.resolve("javascript"), Some(Language::JavaScript));
        assert_eq!(registry.resolve("go"), Some(Language::Go));
        assert_eq!(registry.resolve("python"), None);
        assert_eq!(registry.resolve("cobol"), None);
    }

    #[test]
    fn test_command_for_appends_path() {
        let registry = LanguageRegistry::from_toml(TEST_TABLE).unwrap();
        let cmd = registry
            .lookup(Language::Go)
            .unwrap()
            .command_for(Path::new("/tmp/main.go"));
        assert_eq!(cmd.program, "go");
        assert_eq!(cmd.args, vec!["run", "/tmp/main.go"]);
    }

    #[test]
    fn test_rejects_duplicate_alias() {
        let table = r#"
[javascript]
extension = "js"
command = "node"
aliases = ["x"]

[python]
extension = "py"
command = "python3"
aliases = ["X"]
"#;
        assert!(LanguageRegistry::from_toml(table).is_err());
    }

    #[test]
    fn test_rejects_empty_command() {
        let table = "[shell]\nextension = \"sh\"\ncommand = \"  \"\n";
        assert!(LanguageRegistry::from_toml(table).is_err());
    }

    #[test]
    fn test_rejects_unknown_language() {
        let table = "[cobol]\nextension = \"cob\"\ncommand = \"cobc\"\n";
        assert!(LanguageRegistry::from_toml(table).is_err());
    }

    #[test]
    fn test_embedded_table_covers_every_language() {
        let registry = init_languages(None).unwrap();
        for language in [
            Language::JavaScript,
            Language::Go,
            Language::Python,
            Language::Shell,
        ] {
            assert!(registry.lookup(language).is_ok(), "{} missing", language);
        }
        assert_eq!(registry.resolve("js"), Some(Language::JavaScript));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", TEST_TABLE).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let registry = LanguageRegistry::from_toml(&content).unwrap();
        assert!(registry.lookup(Language::Go).is_ok());
    }
}

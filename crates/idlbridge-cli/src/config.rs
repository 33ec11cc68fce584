//! The `idlbridge.toml` configuration file and its command-line overrides.

use std::path::{Path, PathBuf};

use idlbridge_codegen::{BackendKind, DualPathPolicy, Options};
use serde::Deserialize;

use crate::error::{convert_toml_error, CliError};
use crate::io::read_file;

pub const DEFAULT_CONFIG: &str = "idlbridge.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path of the JSON interface library
    pub library: Option<PathBuf>,

    /// Native namespace holding the `I<Name>` interface types
    pub namespace: Option<String>,

    #[serde(default)]
    pub outputs: Outputs,

    #[serde(default)]
    pub typescript: TypeScriptConfig,
}

/// Output file of each backend; absent backends are not run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Outputs {
    pub typescript: Option<PathBuf>,
    pub nan: Option<PathBuf>,
    pub napi: Option<PathBuf>,
    pub jsi: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeScriptConfig {
    #[serde(default)]
    pub dual_path: DualPathPolicy,
}

/// Values given on the command line. Each one replaces its configured
/// counterpart.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub library: Option<PathBuf>,
    pub namespace: Option<String>,
    pub outputs: Outputs,
}

/// Everything a generation run needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub library: PathBuf,
    pub options: Options,
    pub outputs: Vec<(BackendKind, PathBuf)>,
}

impl Config {
    /// Parses a configuration document. `origin` names it in errors.
    pub fn parse(source: &str, origin: &str) -> Result<Self, CliError> {
        toml::from_str(source).map_err(|e| convert_toml_error(e, origin, source))
    }

    /// Reads the configuration at `path`. Relative paths inside it are taken
    /// relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let source = read_file(path)?;
        let config = Self::parse(&source, &path.display().to_string())?;
        log::debug!("Loaded configuration from {}", path.display());

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut() {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        };
        resolve(&mut self.library);
        resolve(&mut self.outputs.typescript);
        resolve(&mut self.outputs.nan);
        resolve(&mut self.outputs.napi);
        resolve(&mut self.outputs.jsi);
        self
    }

    pub fn merge(mut self, overrides: Overrides) -> Self {
        self.library = overrides.library.or(self.library);
        self.namespace = overrides.namespace.or(self.namespace);

        let outputs = &mut self.outputs;
        outputs.typescript = overrides.outputs.typescript.or(outputs.typescript.take());
        outputs.nan = overrides.outputs.nan.or(outputs.nan.take());
        outputs.napi = overrides.outputs.napi.or(outputs.napi.take());
        outputs.jsi = overrides.outputs.jsi.or(outputs.jsi.take());
        self
    }

    pub fn into_settings(self) -> Result<Settings, CliError> {
        let library = self.library.ok_or(CliError::MissingSetting { key: "library" })?;
        let namespace = self
            .namespace
            .ok_or(CliError::MissingSetting { key: "namespace" })?;

        let outputs: Vec<(BackendKind, PathBuf)> = [
            (BackendKind::TypeScript, self.outputs.typescript),
            (BackendKind::Nan, self.outputs.nan),
            (BackendKind::Napi, self.outputs.napi),
            (BackendKind::Jsi, self.outputs.jsi),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.map(|path| (kind, path)))
        .collect();
        if outputs.is_empty() {
            return Err(CliError::NoOutputs);
        }

        let mut options = Options::new(namespace);
        options.typescript_dual_path = self.typescript.dual_path;

        Ok(Settings {
            library,
            options,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
library = "api.json"
namespace = "fb"

[outputs]
typescript = "gen/api.ts"
napi = "/abs/napi.h"

[typescript]
dual_path = "flagged"
"#;

    #[test]
    fn parses_every_section() {
        let config = Config::parse(FULL, "idlbridge.toml").unwrap();

        assert_eq!(config.library, Some(PathBuf::from("api.json")));
        assert_eq!(config.namespace.as_deref(), Some("fb"));
        assert_eq!(config.outputs.typescript, Some(PathBuf::from("gen/api.ts")));
        assert_eq!(config.outputs.nan, None);
        assert_eq!(config.typescript.dual_path, DualPathPolicy::Flagged);
    }

    #[test]
    fn dual_path_defaults_to_always() {
        let config = Config::parse("namespace = \"fb\"", "idlbridge.toml").unwrap();
        assert_eq!(config.typescript.dual_path, DualPathPolicy::Always);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let config = Config::parse(FULL, "idlbridge.toml")
            .unwrap()
            .relative_to(Path::new("project"));

        assert_eq!(config.library, Some(PathBuf::from("project/api.json")));
        assert_eq!(config.outputs.typescript, Some(PathBuf::from("project/gen/api.ts")));
        assert_eq!(config.outputs.napi, Some(PathBuf::from("/abs/napi.h")));
    }

    #[test]
    fn overrides_replace_configured_values() {
        let config = Config::parse(FULL, "idlbridge.toml").unwrap().merge(Overrides {
            namespace: Some("Firebird".to_string()),
            outputs: Outputs {
                jsi: Some(PathBuf::from("jsi.h")),
                typescript: Some(PathBuf::from("other.ts")),
                ..Outputs::default()
            },
            ..Overrides::default()
        });

        let settings = config.into_settings().unwrap();
        assert_eq!(settings.library, PathBuf::from("api.json"));
        assert_eq!(settings.options.namespace, "Firebird");
        assert_eq!(settings.options.typescript_dual_path, DualPathPolicy::Flagged);
        assert_eq!(
            settings.outputs,
            [
                (BackendKind::TypeScript, PathBuf::from("other.ts")),
                (BackendKind::Napi, PathBuf::from("/abs/napi.h")),
                (BackendKind::Jsi, PathBuf::from("jsi.h")),
            ]
        );
    }

    #[test]
    fn requires_an_output() {
        let config = Config::parse("library = \"api.json\"\nnamespace = \"fb\"", "idlbridge.toml").unwrap();
        assert!(matches!(config.into_settings(), Err(CliError::NoOutputs)));
    }

    #[test]
    fn requires_a_namespace() {
        let config = Config::parse("library = \"api.json\"", "idlbridge.toml").unwrap();
        assert!(matches!(
            config.into_settings(),
            Err(CliError::MissingSetting { key: "namespace" })
        ));
    }

    #[test]
    fn unknown_keys_point_at_the_source() {
        let err = Config::parse("library = \"api.json\"\nouput = 1\n", "idlbridge.toml").unwrap_err();
        let CliError::ConfigError { span, message, .. } = &err else {
            panic!("expected a configuration error, got {err:?}");
        };
        assert!(message.contains("unknown field `ouput`"), "{message}");
        assert!(span.is_some());
    }
}

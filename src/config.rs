//! Engine configuration: the in-memory [`EngineConfig`], its JSON file form,
//! and environment overrides.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::collector::{Collector, PaneFilter};
use crate::error::ConfigError;
use crate::matcher::Matcher;
use crate::submit::normalize_keys;
use crate::target::{Target, TargetConfig};
use crate::types::*;

/// Everything a broadcast engine needs to know. Immutable once handed to
/// [`Engine::new`](crate::engine::Engine::new).
pub struct EngineConfig {
    /// Match priority order, first enabled match wins.
    pub targets: Vec<Arc<Target>>,
    pub submit_keys: Vec<KeyDescriptor>,
    pub submit_text: Option<String>,
    pub scope: Scope,
    pub tab_mode: TabMode,
    pub match_fields: Vec<MatchField>,
    pub filter: Option<Box<dyn PaneFilter>>,
    pub matcher: Option<Box<dyn Matcher>>,
    pub collector: Option<Box<dyn Collector>>,
    /// Pair panes no target matched with the default target instead of
    /// dropping them.
    pub include_unmatched: bool,
    pub default_target: Option<Arc<Target>>,
    pub send_key_mode: SendKeyMode,
    /// Encode modified Enter as CSI-u in text send mode.
    pub csi_u: bool,
    pub log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            submit_keys: vec![KeyDescriptor::enter()],
            submit_text: None,
            scope: Scope::ActiveTab,
            tab_mode: TabMode::AllPanes,
            match_fields: DEFAULT_MATCH_FIELDS.to_vec(),
            filter: None,
            matcher: None,
            collector: None,
            include_unmatched: false,
            default_target: None,
            send_key_mode: SendKeyMode::Window,
            csi_u: false,
            log: false,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("targets", &self.targets)
            .field("submit_keys", &self.submit_keys)
            .field("submit_text", &self.submit_text)
            .field("scope", &self.scope)
            .field("tab_mode", &self.tab_mode)
            .field("match_fields", &self.match_fields)
            .field("filter", &self.filter.is_some())
            .field("matcher", &self.matcher.is_some())
            .field("collector", &self.collector.is_some())
            .field("include_unmatched", &self.include_unmatched)
            .field("default_target", &self.default_target)
            .field("send_key_mode", &self.send_key_mode)
            .field("csi_u", &self.csi_u)
            .field("log", &self.log)
            .finish()
    }
}

impl EngineConfig {
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(Arc::new(target));
        self
    }

    pub fn with_filter(mut self, filter: impl PaneFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    pub fn with_collector(mut self, collector: impl Collector + 'static) -> Self {
        self.collector = Some(Box::new(collector));
        self
    }

    pub fn with_default_target(mut self, target: Target) -> Self {
        self.default_target = Some(Arc::new(target));
        self.include_unmatched = true;
        self
    }

    /// Set one option by name, the way the environment and `-o key=value`
    /// on the command line do.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let key = key.trim().to_lowercase().replace('_', "-");
        if key == "submit-text" {
            self.submit_text = Some(value.to_string());
            return Ok(());
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key.as_str() {
            "scope" => self.scope = value.parse()?,
            "tab-mode" => self.tab_mode = value.parse()?,
            "send-key-mode" => self.send_key_mode = value.parse()?,
            "csi-u" => self.csi_u = parse_flag(value),
            "log" => self.log = parse_flag(value),
            "include-unmatched" => self.include_unmatched = parse_flag(value),
            "match-fields" => self.match_fields = parse_fields(value)?,
            other => return Err(ConfigError::Invalid(format!("unknown option '{}'", other))),
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "on" | "true" | "1" | "yes")
}

fn parse_fields(value: &str) -> Result<Vec<MatchField>, ConfigError> {
    value.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_lowercase().as_str() {
            "title" => Ok(MatchField::Title),
            "process" => Ok(MatchField::Process),
            "argv" => Ok(MatchField::Argv),
            _ => Err(ConfigError::Invalid(format!("unknown match field '{}'", s))),
        })
        .collect()
}

/// The configuration file schema.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    targets: Vec<TargetConfig>,
    submit_keys: Option<Value>,
    submit_text: Option<String>,
    scope: Option<Scope>,
    tab_mode: Option<TabMode>,
    match_fields: Option<Vec<MatchField>>,
    include_unmatched: bool,
    default_target: Option<TargetConfig>,
    send_key_mode: Option<SendKeyMode>,
    csi_u: bool,
    log: bool,
}

impl From<FileConfig> for EngineConfig {
    fn from(file: FileConfig) -> Self {
        let defaults = EngineConfig::default();
        let submit_keys = match file.submit_keys {
            None => defaults.submit_keys,
            Some(Value::Bool(false)) => Vec::new(),
            Some(raw) => normalize_keys(&raw),
        };
        let default_target = file.default_target.map(|t| {
            let mut t = t.into_target(0);
            if t.name == "target-1" { t.name = "default".to_string(); }
            Arc::new(t)
        });
        EngineConfig {
            targets: file.targets.into_iter().enumerate()
                .map(|(i, t)| Arc::new(t.into_target(i)))
                .collect(),
            submit_keys,
            submit_text: file.submit_text,
            scope: file.scope.unwrap_or_default(),
            tab_mode: file.tab_mode.unwrap_or_default(),
            match_fields: file.match_fields.unwrap_or(defaults.match_fields),
            include_unmatched: file.include_unmatched || default_target.is_some(),
            default_target,
            send_key_mode: file.send_key_mode.unwrap_or_default(),
            csi_u: file.csi_u,
            log: file.log,
            ..defaults
        }
    }
}

fn parse_at(content: &str, path: &Path) -> Result<EngineConfig, ConfigError> {
    let file: FileConfig = serde_json::from_str(content)
        .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
    Ok(file.into())
}

/// Parse a JSON configuration document.
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    parse_at(content, Path::new("<inline>"))
}

pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    parse_at(&content, path)
}

/// Candidate configuration files, most specific first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(p) = env::var("PANECAST_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE")).unwrap_or_default();
    if !home.is_empty() {
        paths.push(Path::new(&home).join(".panecast.json"));
    }
    let config_home = env::var("XDG_CONFIG_HOME").ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| (!home.is_empty()).then(|| Path::new(&home).join(".config")));
    if let Some(dir) = config_home {
        paths.push(dir.join("panecast").join("config.json"));
    }
    paths
}

/// Load the first existing configuration file, or the defaults when there
/// is none. A file that exists but does not parse is an error.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    for path in config_paths() {
        if path.is_file() {
            log::debug!("loading config from {}", path.display());
            return load_config_from(&path);
        }
    }
    Ok(EngineConfig::default())
}

const ENV_OPTIONS: &[(&str, &str)] = &[
    ("PANECAST_SCOPE", "scope"),
    ("PANECAST_TAB_MODE", "tab-mode"),
    ("PANECAST_SEND_KEY_MODE", "send-key-mode"),
    ("PANECAST_CSI_U", "csi-u"),
    ("PANECAST_LOG", "log"),
];

/// Apply `PANECAST_*` overrides. `lookup` is `std::env::var` in practice.
/// Invalid values are logged and ignored.
pub fn apply_env_overrides(config: &mut EngineConfig, lookup: impl Fn(&str) -> Option<String>) {
    for (var, option) in ENV_OPTIONS {
        if let Some(value) = lookup(var) {
            if let Err(e) = config.set_option(option, &value) {
                log::warn!("ignoring {}: {}", var, e);
            }
        }
    }
}

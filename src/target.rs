//! Targets: which panes a broadcast treats specially, and how they submit.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::CapabilityError;
use crate::host::Host;
use crate::submit::normalize_keys;
use crate::types::{Context, KeyDescriptor, MatchField, PaneId, SendKeyMode};

/// Custom match test for a target.
pub type Predicate = Arc<dyn Fn(PaneId, &Context) -> Result<bool, CapabilityError> + Send + Sync>;

/// Replaces the whole default submit behavior for a target.
pub type SubmitAction = Arc<dyn Fn(&dyn Host, PaneId, &Target) -> Result<(), CapabilityError> + Send + Sync>;

#[derive(Clone)]
pub enum TargetMatch {
    /// Substring patterns, tested case-insensitively against context fields.
    Patterns(Vec<String>),
    Predicate(Predicate),
}

/// Submit keys a target asks for, with the alternate spellings
/// (`submit_keys`, `submit_key`, `submit`) already folded in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyOverride {
    /// Use the engine's default submit keys.
    #[default]
    Inherit,
    /// Never send submit keys.
    Disabled,
    Keys(Vec<KeyDescriptor>),
}

impl KeyOverride {
    /// Fold the raw configuration fields into one override. The first
    /// applicable rule wins: explicit disable (`disable_submit_keys` or
    /// `submit_keys: false`), then `submit_keys`, `submit_key`, `submit`.
    pub fn resolve(
        disable: bool,
        submit_keys: Option<&Value>,
        submit_key: Option<&Value>,
        submit: Option<&Value>,
    ) -> Self {
        if disable || matches!(submit_keys, Some(Value::Bool(false))) {
            return KeyOverride::Disabled;
        }
        match submit_keys.or(submit_key).or(submit) {
            Some(raw) => KeyOverride::Keys(normalize_keys(raw)),
            None => KeyOverride::Inherit,
        }
    }
}

#[derive(Clone)]
pub struct Target {
    /// Used in log lines and match listings only.
    pub name: String,
    pub enabled: bool,
    pub matcher: TargetMatch,
    /// Context fields the patterns are tested against; `None` uses the
    /// engine's match fields.
    pub fields: Option<Vec<MatchField>>,
    pub submit_keys: KeyOverride,
    /// `Some("")` suppresses the engine's default submit text.
    pub submit_text: Option<String>,
    pub submit_action: Option<SubmitAction>,
    pub send_key_mode: Option<SendKeyMode>,
}

impl Target {
    /// A pattern target with no patterns, which matches nothing until
    /// [`patterns`](Self::patterns) or [`predicate`](Self::predicate) is set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            matcher: TargetMatch::Patterns(Vec::new()),
            fields: None,
            submit_keys: KeyOverride::Inherit,
            submit_text: None,
            submit_action: None,
            send_key_mode: None,
        }
    }

    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matcher = TargetMatch::Patterns(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn predicate<F>(mut self, f: F) -> Self
    where
        F: Fn(PaneId, &Context) -> Result<bool, CapabilityError> + Send + Sync + 'static,
    {
        self.matcher = TargetMatch::Predicate(Arc::new(f));
        self
    }

    pub fn fields(mut self, fields: Vec<MatchField>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn submit_keys(mut self, keys: Vec<KeyDescriptor>) -> Self {
        self.submit_keys = KeyOverride::Keys(keys);
        self
    }

    pub fn disable_submit_keys(mut self) -> Self {
        self.submit_keys = KeyOverride::Disabled;
        self
    }

    pub fn submit_text(mut self, text: impl Into<String>) -> Self {
        self.submit_text = Some(text.into());
        self
    }

    pub fn submit_action<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Host, PaneId, &Target) -> Result<(), CapabilityError> + Send + Sync + 'static,
    {
        self.submit_action = Some(Arc::new(f));
        self
    }

    pub fn send_key_mode(mut self, mode: SendKeyMode) -> Self {
        self.send_key_mode = Some(mode);
        self
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matcher = match &self.matcher {
            TargetMatch::Patterns(p) => format!("patterns {:?}", p),
            TargetMatch::Predicate(_) => "predicate".to_string(),
        };
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("matcher", &matcher)
            .field("fields", &self.fields)
            .field("submit_keys", &self.submit_keys)
            .field("submit_text", &self.submit_text)
            .field("submit_action", &self.submit_action.is_some())
            .field("send_key_mode", &self.send_key_mode)
            .finish()
    }
}

/// A target as written in the JSON configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    #[serde(rename = "match", alias = "patterns")]
    pub patterns: Vec<String>,
    pub fields: Option<Vec<MatchField>>,
    pub disable_submit_keys: bool,
    pub submit_keys: Option<Value>,
    pub submit_key: Option<Value>,
    pub submit: Option<Value>,
    pub submit_text: Option<String>,
    pub send_key_mode: Option<SendKeyMode>,
}

impl TargetConfig {
    /// Build the runtime target. `index` names unnamed targets.
    pub fn into_target(self, index: usize) -> Target {
        let submit_keys = KeyOverride::resolve(
            self.disable_submit_keys,
            self.submit_keys.as_ref(),
            self.submit_key.as_ref(),
            self.submit.as_ref(),
        );
        Target {
            name: self.name.unwrap_or_else(|| format!("target-{}", index + 1)),
            enabled: self.enabled.unwrap_or(true),
            matcher: TargetMatch::Patterns(self.patterns),
            fields: self.fields,
            submit_keys,
            submit_text: self.submit_text,
            submit_action: None,
            send_key_mode: self.send_key_mode,
        }
    }
}

//! The broadcast dispatcher.
//!
//! Every operation collects panes, classifies them against the configured
//! targets and then sends to each matched pane in order. A failure on one
//! pane is logged (when logging is on) and never stops the others; none of
//! the operations return an error.

use std::sync::Arc;

use crate::collector::{Collector, PaneFilter, TabCollector};
use crate::config::EngineConfig;
use crate::context;
use crate::host::Host;
use crate::keys;
use crate::matcher::{Matcher, PatternMatcher};
use crate::submit::{resolve_submit_keys, resolve_submit_text};
use crate::target::Target;
use crate::types::{Choice, PaneId, SendKeyMode};

/// A pane selected for broadcast and the target that governs it.
#[derive(Debug, Clone)]
pub struct Match {
    pub pane: PaneId,
    pub target: Arc<Target>,
}

/// Options for [`Engine::prompt_and_broadcast`].
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub description: String,
    /// Follow the text with the submit mechanism.
    pub submit: bool,
    /// Broadcast an empty line instead of ignoring it.
    pub allow_empty: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            description: "Broadcast to panes".to_string(),
            submit: true,
            allow_empty: false,
        }
    }
}

pub const MENU_TEXT: &str = "text";
pub const MENU_SEND: &str = "send";
pub const MENU_SUBMIT: &str = "submit";

pub struct Engine {
    config: EngineConfig,
    matcher: Box<dyn Matcher>,
    collector: Box<dyn Collector>,
    filter: Option<Box<dyn PaneFilter>>,
    default_target: Arc<Target>,
}

impl Engine {
    /// Fix the strategies once: custom matcher and collector when the config
    /// carries them, the built-in ones otherwise.
    pub fn new(mut config: EngineConfig) -> Self {
        let matcher: Box<dyn Matcher> = match config.matcher.take() {
            Some(m) => m,
            None => Box::new(PatternMatcher { fields: config.match_fields.clone(), log: config.log }),
        };
        let collector: Box<dyn Collector> = config.collector.take().unwrap_or_else(|| Box::new(TabCollector));
        let filter = config.filter.take();
        let default_target = config.default_target.clone()
            .unwrap_or_else(|| Arc::new(Target::new("default")));
        Self { config, matcher, collector, filter, default_target }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Panes that would receive a broadcast right now, with their targets.
    /// Unmatched panes get the default target when unmatched inclusion is
    /// on or no targets are configured at all.
    pub fn resolve_matches(&self, host: &dyn Host) -> Vec<Match> {
        let panes = match self.collector.collect(host, &self.config) {
            Ok(panes) => panes,
            Err(e) => {
                if self.config.log { log::error!("collecting panes failed: {}", e); }
                return Vec::new();
            }
        };
        let use_default = self.config.include_unmatched || self.config.targets.is_empty();
        let mut matches = Vec::with_capacity(panes.len());
        for pane in panes {
            let context = context::extract(host, pane);
            let found = match self.matcher.find(pane, &context, &self.config.targets) {
                Ok(found) => found,
                Err(e) => {
                    if self.config.log { log::error!("matcher failed on pane {}: {}", pane, e); }
                    None
                }
            };
            let target = match found {
                Some(t) => t,
                None if use_default => Arc::clone(&self.default_target),
                None => continue,
            };
            if let Some(filter) = &self.filter {
                match filter.accept(pane, &context) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        if self.config.log { log::error!("pane filter failed on pane {}: {}", pane, e); }
                        continue;
                    }
                }
            }
            matches.push(Match { pane, target });
        }
        matches
    }

    /// Send `text` verbatim to every matched pane.
    pub fn broadcast_text(&self, host: &dyn Host, text: &str) -> Vec<Match> {
        let matches = self.resolve_matches(host);
        if self.config.log { log::info!("broadcasting text to {} panes", matches.len()); }
        for m in &matches {
            self.send_text(host, m.pane, text);
        }
        matches
    }

    /// Run the submit mechanism on every matched pane.
    pub fn broadcast_submit(&self, host: &dyn Host) -> Vec<Match> {
        let matches = self.resolve_matches(host);
        if self.config.log { log::info!("broadcasting submit to {} panes", matches.len()); }
        for m in &matches {
            self.submit(host, m);
        }
        matches
    }

    /// Per pane: send `text`, then submit. The submit step runs even when
    /// the text could not be sent.
    pub fn broadcast_text_and_submit(&self, host: &dyn Host, text: &str) -> Vec<Match> {
        let matches = self.resolve_matches(host);
        if self.config.log { log::info!("broadcasting text and submit to {} panes", matches.len()); }
        for m in &matches {
            self.send_text(host, m.pane, text);
            self.submit(host, m);
        }
        matches
    }

    /// Ask the host for a line on behalf of `pane` and broadcast it. A
    /// cancelled prompt does nothing; so does an empty line unless
    /// `allow_empty` is set.
    pub fn prompt_and_broadcast(&self, host: &dyn Host, pane: PaneId, options: &PromptOptions) {
        let submit = options.submit;
        let allow_empty = options.allow_empty;
        host.prompt_line(pane, &options.description, Box::new(move |line: String| {
            if line.is_empty() && !allow_empty {
                return;
            }
            if submit {
                self.broadcast_text_and_submit(host, &line);
            } else {
                self.broadcast_text(host, &line);
            }
        }));
    }

    /// Offer text / text-and-submit / submit-only, then carry it out.
    pub fn menu_and_broadcast(&self, host: &dyn Host, pane: PaneId, title: &str) {
        let choices = [
            Choice::new(MENU_TEXT, "Send text"),
            Choice::new(MENU_SEND, "Send text and submit"),
            Choice::new(MENU_SUBMIT, "Submit only"),
        ];
        host.choose(pane, title, &choices, Box::new(move |id: String| {
            match id.as_str() {
                MENU_SUBMIT => { self.broadcast_submit(host); }
                MENU_TEXT | MENU_SEND => {
                    let options = PromptOptions { submit: id == MENU_SEND, ..PromptOptions::default() };
                    self.prompt_and_broadcast(host, pane, &options);
                }
                other => {
                    if self.config.log { log::warn!("unknown menu choice '{}'", other); }
                }
            }
        }));
    }

    fn send_text(&self, host: &dyn Host, pane: PaneId, text: &str) {
        if let Err(e) = host.send_text(pane, text) {
            if self.config.log { log::error!("sending text to pane {} failed: {}", pane, e); }
        }
    }

    fn submit(&self, host: &dyn Host, m: &Match) {
        let target = &*m.target;
        if let Some(action) = &target.submit_action {
            if let Err(e) = action(host, m.pane, target) {
                if self.config.log { log::error!("submit action of '{}' failed on pane {}: {}", target.name, m.pane, e); }
            }
            return;
        }
        if let Some(text) = resolve_submit_text(target, &self.config).filter(|t| !t.is_empty()) {
            self.send_text(host, m.pane, &text);
        }
        let mode = target.send_key_mode.unwrap_or(self.config.send_key_mode);
        for key in resolve_submit_keys(target, &self.config) {
            let encoded = match mode {
                SendKeyMode::Text => keys::encode(&key, self.config.csi_u),
                SendKeyMode::Window => None,
            };
            let result = match encoded {
                Some(seq) => host.send_text(m.pane, &seq),
                None => host.send_key(m.pane, &key.key, &key.mods),
            };
            if let Err(e) = result {
                if self.config.log { log::error!("sending {} to pane {} failed: {}", keys::tmux_key_name(&key), m.pane, e); }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::error::CapabilityError;
    use crate::testing::{tab, FakeHost, Sent};
    use crate::types::{Context, KeyDescriptor, Scope, TabMode};

    fn text(pane: u64, s: &str) -> Sent { Sent::Text(PaneId(pane), s.to_string()) }
    fn key(pane: u64, k: &str, mods: &str) -> Sent { Sent::Key(PaneId(pane), k.to_string(), mods.to_string()) }

    fn host3() -> FakeHost {
        let mut host = FakeHost::single_tab(&[1, 2, 3]);
        host.set_pane(1, "claude", "node", &["node", "/usr/bin/claude"]);
        host.set_pane(2, "~/src", "zsh", &["-zsh"]);
        host.set_pane(3, "notes.md", "nvim", &["nvim", "notes.md"]);
        host
    }

    #[test]
    fn test_broadcast_text_every_pane_in_order() {
        let host = host3();
        let engine = Engine::new(EngineConfig::default());
        let matches = engine.broadcast_text(&host, "ls\n");
        assert_eq!(matches.len(), 3);
        assert_eq!(host.sent(), vec![text(1, "ls\n"), text(2, "ls\n"), text(3, "ls\n")]);
    }

    #[test]
    fn test_only_matched_panes_with_targets() {
        let host = host3();
        let engine = Engine::new(EngineConfig::default().with_target(Target::new("ai").patterns(["claude"])));
        let matches = engine.broadcast_text(&host, "hi");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target.name, "ai");
        assert_eq!(host.sent(), vec![text(1, "hi")]);
    }

    #[test]
    fn test_include_unmatched_uses_default_target() {
        let host = host3();
        let mut config = EngineConfig::default().with_target(Target::new("ai").patterns(["claude"]));
        config.include_unmatched = true;
        let names: Vec<String> = Engine::new(config).resolve_matches(&host)
            .iter().map(|m| m.target.name.clone()).collect();
        assert_eq!(names, vec!["ai", "default", "default"]);
    }

    #[test]
    fn test_text_then_submit_per_pane() {
        let host = FakeHost::single_tab(&[1, 2]);
        let engine = Engine::new(EngineConfig::default());
        engine.broadcast_text_and_submit(&host, "make");
        assert_eq!(host.sent(), vec![
            text(1, "make"), key(1, "Enter", ""),
            text(2, "make"), key(2, "Enter", ""),
        ]);
    }

    #[test]
    fn test_submit_runs_after_failed_text() {
        let mut host = FakeHost::single_tab(&[1, 2]);
        host.fail_text(1);
        let engine = Engine::new(EngineConfig { log: true, ..EngineConfig::default() });
        let matches = engine.broadcast_text_and_submit(&host, "x");
        assert_eq!(matches.len(), 2);
        assert_eq!(host.sent(), vec![key(1, "Enter", ""), text(2, "x"), key(2, "Enter", "")]);
    }

    #[test]
    fn test_failed_key_does_not_stop_others() {
        let mut host = FakeHost::single_tab(&[1, 2]);
        host.fail_key(1);
        let engine = Engine::new(EngineConfig::default());
        engine.broadcast_submit(&host);
        assert_eq!(host.sent(), vec![key(2, "Enter", "")]);
    }

    #[test]
    fn test_submit_text_before_keys() {
        let host = host3();
        let config = EngineConfig {
            submit_text: Some(" ".into()),
            ..EngineConfig::default()
        }
        .with_target(Target::new("ai").patterns(["claude"]))
        .with_target(Target::new("vim").patterns(["nvim"]).submit_text("").disable_submit_keys());
        Engine::new(config).broadcast_submit(&host);
        assert_eq!(host.sent(), vec![text(1, " "), key(1, "Enter", "")]);
    }

    #[test]
    fn test_text_mode_encodes_enter() {
        let host = FakeHost::single_tab(&[1]);
        let config = EngineConfig {
            send_key_mode: SendKeyMode::Text,
            csi_u: true,
            ..EngineConfig::default()
        }
        .with_target(Target::new("all").predicate(|_, _| Ok(true)).submit_keys(vec![
            KeyDescriptor::new("Enter", "CTRL"),
            KeyDescriptor::new("Tab", ""),
        ]));
        Engine::new(config).broadcast_submit(&host);
        assert_eq!(host.sent(), vec![text(1, "\x1b[13;5u"), key(1, "Tab", "")]);
    }

    #[test]
    fn test_target_send_mode_override() {
        let host = FakeHost::single_tab(&[1]);
        let config = EngineConfig { send_key_mode: SendKeyMode::Text, ..EngineConfig::default() }
            .with_target(Target::new("w").predicate(|_, _| Ok(true)).send_key_mode(SendKeyMode::Window));
        Engine::new(config).broadcast_submit(&host);
        assert_eq!(host.sent(), vec![key(1, "Enter", "")]);

        let host = FakeHost::single_tab(&[1]);
        let config = EngineConfig::default()
            .with_target(Target::new("t").predicate(|_, _| Ok(true)).send_key_mode(SendKeyMode::Text));
        Engine::new(config).broadcast_submit(&host);
        assert_eq!(host.sent(), vec![text(1, "\r")]);
    }

    #[test]
    fn test_submit_action_replaces_default() {
        let host = FakeHost::single_tab(&[1, 2]);
        let config = EngineConfig { submit_text: Some("!".into()), ..EngineConfig::default() }
            .with_target(Target::new("custom").predicate(|p, _| Ok(p == PaneId(1)))
                .submit_action(|host, pane, target| {
                    host.send_text(pane, &format!("[{}]", target.name))?;
                    Ok(())
                }))
            .with_target(Target::new("broken").predicate(|_, _| Ok(true))
                .submit_action(|_, _, _| Err(CapabilityError::new("nope"))));
        let engine = Engine::new(EngineConfig { log: true, ..config });
        engine.broadcast_text_and_submit(&host, "go");
        assert_eq!(host.sent(), vec![text(1, "go"), text(1, "[custom]"), text(2, "go")]);
    }

    #[test]
    fn test_filter_excludes_panes() {
        let host = host3();
        let config = EngineConfig::default()
            .with_filter(|pane: PaneId, ctx: &Context| -> Result<bool, CapabilityError> {
                if pane == PaneId(3) { return Err(CapabilityError::new("bad pane")); }
                Ok(ctx.process != "zsh")
            });
        let matches = Engine::new(config).broadcast_text(&host, "a");
        assert_eq!(matches.len(), 1);
        assert_eq!(host.sent(), vec![text(1, "a")]);
    }

    #[test]
    fn test_custom_collector_and_matcher() {
        let host = host3();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let config = EngineConfig::default()
            .with_target(Target::new("only"))
            .with_collector(|_: &dyn Host, _: &EngineConfig| -> Result<Vec<PaneId>, CapabilityError> {
                Ok(vec![PaneId(3), PaneId(1)])
            })
            .with_matcher(move |_: PaneId, _: &Context, t: &[Arc<Target>]| -> Result<Option<Arc<Target>>, CapabilityError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(t.first().cloned())
            });
        let engine = Engine::new(config);
        // Strategies move into the engine; the remaining settings stay readable.
        assert!(engine.config().matcher.is_none() && engine.config().collector.is_none());
        assert_eq!(engine.config().targets.len(), 1);
        let matches = engine.broadcast_text(&host, "z");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(matches.iter().map(|m| m.pane.0).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(host.sent(), vec![text(3, "z"), text(1, "z")]);
    }

    #[test]
    fn test_failing_collector_and_matcher() {
        let host = host3();
        let config = EngineConfig { log: true, ..EngineConfig::default() }
            .with_collector(|_: &dyn Host, _: &EngineConfig| -> Result<Vec<PaneId>, CapabilityError> {
                Err(CapabilityError::new("gone"))
            });
        assert!(Engine::new(config).broadcast_text(&host, "q").is_empty());

        let config = EngineConfig::default()
            .with_target(Target::new("t"))
            .with_matcher(|_: PaneId, _: &Context, _: &[Arc<Target>]| -> Result<Option<Arc<Target>>, CapabilityError> {
                Err(CapabilityError::new("confused"))
            });
        assert!(Engine::new(config).broadcast_text(&host, "q").is_empty());
        assert!(host.sent().is_empty());
    }

    #[test]
    fn test_enumeration_failure_sends_nothing() {
        let mut host = host3();
        host.fail_enumeration = true;
        assert!(Engine::new(EngineConfig::default()).broadcast_submit(&host).is_empty());
        assert!(host.sent().is_empty());
    }

    #[test]
    fn test_all_tabs_active_pane_scope() {
        let host = FakeHost::new(vec![tab(1, &[1, 2], Some(2)), tab(2, &[3], Some(3))], Some(0));
        let config = EngineConfig { scope: Scope::AllTabs, tab_mode: TabMode::ActivePane, ..EngineConfig::default() };
        Engine::new(config).broadcast_text(&host, "t");
        assert_eq!(host.sent(), vec![text(2, "t"), text(3, "t")]);
    }

    #[test]
    fn test_prompt_and_broadcast() {
        let host = FakeHost::single_tab(&[1]);
        let engine = Engine::new(EngineConfig::default());
        host.queue_line("echo hi");
        engine.prompt_and_broadcast(&host, PaneId(1), &PromptOptions::default());
        assert_eq!(host.sent(), vec![text(1, "echo hi"), key(1, "Enter", "")]);
        assert_eq!(*host.prompts.borrow(), vec!["Broadcast to panes".to_string()]);
    }

    #[test]
    fn test_prompt_empty_and_cancel() {
        let host = FakeHost::single_tab(&[1]);
        let engine = Engine::new(EngineConfig::default());
        host.queue_line("");
        engine.prompt_and_broadcast(&host, PaneId(1), &PromptOptions::default());
        engine.prompt_and_broadcast(&host, PaneId(1), &PromptOptions::default());
        assert!(host.sent().is_empty());

        host.queue_line("");
        let options = PromptOptions { allow_empty: true, submit: false, ..PromptOptions::default() };
        engine.prompt_and_broadcast(&host, PaneId(1), &options);
        assert_eq!(host.sent(), vec![text(1, "")]);
    }

    #[test]
    fn test_menu_and_broadcast() {
        let host = FakeHost::single_tab(&[1]);
        let engine = Engine::new(EngineConfig::default());
        host.queue_choice(MENU_SUBMIT);
        engine.menu_and_broadcast(&host, PaneId(1), "Broadcast");
        assert_eq!(host.sent(), vec![key(1, "Enter", "")]);

        let host = FakeHost::single_tab(&[1]);
        host.queue_choice(MENU_TEXT);
        host.queue_line("pwd");
        engine.menu_and_broadcast(&host, PaneId(1), "Broadcast");
        assert_eq!(host.sent(), vec![text(1, "pwd")]);

        let host = FakeHost::single_tab(&[1]);
        host.queue_choice("bogus");
        engine.menu_and_broadcast(&host, PaneId(1), "Broadcast");
        assert!(host.sent().is_empty());
    }
}

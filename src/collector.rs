use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::error::CapabilityError;
use crate::host::Host;
use crate::types::{Context, PaneId, Scope, Tab, TabMode};

/// Produces the candidate panes for one dispatch, in order and without
/// repeats.
pub trait Collector: Send + Sync {
    fn collect(&self, host: &dyn Host, config: &EngineConfig) -> Result<Vec<PaneId>, CapabilityError>;
}

impl<F> Collector for F
where
    F: Fn(&dyn Host, &EngineConfig) -> Result<Vec<PaneId>, CapabilityError> + Send + Sync,
{
    fn collect(&self, host: &dyn Host, config: &EngineConfig) -> Result<Vec<PaneId>, CapabilityError> {
        self(host, config)
    }
}

/// Last say on whether a matched pane is broadcast to. Panes it rejects are
/// dropped from the match list entirely.
pub trait PaneFilter: Send + Sync {
    fn accept(&self, pane: PaneId, context: &Context) -> Result<bool, CapabilityError>;
}

impl<F> PaneFilter for F
where
    F: Fn(PaneId, &Context) -> Result<bool, CapabilityError> + Send + Sync,
{
    fn accept(&self, pane: PaneId, context: &Context) -> Result<bool, CapabilityError> {
        self(pane, context)
    }
}

/// Walk tabs by [`Scope`] and take panes by [`TabMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TabCollector;

impl Collector for TabCollector {
    fn collect(&self, host: &dyn Host, config: &EngineConfig) -> Result<Vec<PaneId>, CapabilityError> {
        let tabs = match config.scope {
            Scope::AllTabs => host.tabs()?,
            Scope::ActiveTab => host.active_tab()?.into_iter().collect(),
        };
        Ok(collect_panes(&tabs, config.tab_mode))
    }
}

/// Flatten `tabs` into panes, skipping any pane already seen.
pub fn collect_panes(tabs: &[Tab], mode: TabMode) -> Vec<PaneId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tab in tabs {
        let panes: Vec<PaneId> = match mode {
            TabMode::ActivePane => tab.active_pane.into_iter().collect(),
            TabMode::AllPanes => tab.panes.clone(),
        };
        for pane in panes {
            if seen.insert(pane) {
                out.push(pane);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tab, FakeHost};

    fn two_tabs() -> FakeHost {
        FakeHost::new(vec![tab(1, &[1, 2], Some(2)), tab(2, &[3, 4], Some(3))], Some(1))
    }

    fn run(host: &FakeHost, scope: Scope, tab_mode: TabMode) -> Vec<u64> {
        let config = EngineConfig { scope, tab_mode, ..EngineConfig::default() };
        TabCollector.collect(host, &config).unwrap().into_iter().map(|p| p.0).collect()
    }

    #[test]
    fn test_active_tab_all_panes() {
        assert_eq!(run(&two_tabs(), Scope::ActiveTab, TabMode::AllPanes), vec![3, 4]);
    }

    #[test]
    fn test_all_tabs_active_pane() {
        assert_eq!(run(&two_tabs(), Scope::AllTabs, TabMode::ActivePane), vec![2, 3]);
    }

    #[test]
    fn test_all_tabs_all_panes() {
        assert_eq!(run(&two_tabs(), Scope::AllTabs, TabMode::AllPanes), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_no_active_tab() {
        let host = FakeHost::new(vec![tab(1, &[1], Some(1))], None);
        assert!(run(&host, Scope::ActiveTab, TabMode::AllPanes).is_empty());
    }

    #[test]
    fn test_no_active_pane() {
        let host = FakeHost::new(vec![tab(1, &[1, 2], None)], Some(0));
        assert!(run(&host, Scope::ActiveTab, TabMode::ActivePane).is_empty());
    }

    #[test]
    fn test_dedup_across_paths() {
        // The same pane reachable from two tabs (linked windows) and repeated
        // within one tab appears once.
        let tabs = vec![tab(1, &[5, 6, 5], Some(5)), tab(2, &[6, 7], Some(6))];
        let panes: Vec<u64> = collect_panes(&tabs, TabMode::AllPanes).into_iter().map(|p| p.0).collect();
        assert_eq!(panes, vec![5, 6, 7]);
        let panes: Vec<u64> = collect_panes(&tabs, TabMode::ActivePane).into_iter().map(|p| p.0).collect();
        assert_eq!(panes, vec![5, 6]);
    }

    #[test]
    fn test_enumeration_error_propagates() {
        let mut host = two_tabs();
        host.fail_enumeration = true;
        let config = EngineConfig::default();
        assert!(TabCollector.collect(&host, &config).is_err());
    }
}

//! In-memory host that records every send, for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::HostError;
use crate::host::{ChoiceDone, Host, LineDone};
use crate::types::{Choice, PaneId, Tab};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(PaneId, String),
    Key(PaneId, String, String),
}

#[derive(Default)]
struct PaneInfo {
    title: String,
    process: String,
    argv: Vec<String>,
}

#[derive(Default)]
pub struct FakeHost {
    pub tabs: Vec<Tab>,
    pub active_tab: Option<usize>,
    pub fail_enumeration: bool,
    panes: HashMap<PaneId, PaneInfo>,
    argv_fail: HashSet<PaneId>,
    text_fail: HashSet<PaneId>,
    key_fail: HashSet<PaneId>,
    sent: RefCell<Vec<Sent>>,
    lines: RefCell<VecDeque<String>>,
    choices: RefCell<VecDeque<String>>,
    pub prompts: RefCell<Vec<String>>,
}

pub fn tab(id: u64, panes: &[u64], active: Option<u64>) -> Tab {
    Tab {
        id,
        panes: panes.iter().copied().map(PaneId).collect(),
        active_pane: active.map(PaneId),
    }
}

impl FakeHost {
    pub fn new(tabs: Vec<Tab>, active_tab: Option<usize>) -> Self {
        Self { tabs, active_tab, ..Default::default() }
    }

    /// One active tab holding `panes`, the first of them active.
    pub fn single_tab(panes: &[u64]) -> Self {
        Self::new(vec![tab(1, panes, panes.first().copied())], Some(0))
    }

    pub fn set_pane(&mut self, id: u64, title: &str, process: &str, argv: &[&str]) {
        self.panes.insert(PaneId(id), PaneInfo {
            title: title.to_string(),
            process: process.to_string(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
        });
    }

    pub fn fail_argv(&mut self, id: u64) { self.argv_fail.insert(PaneId(id)); }
    pub fn fail_text(&mut self, id: u64) { self.text_fail.insert(PaneId(id)); }
    pub fn fail_key(&mut self, id: u64) { self.key_fail.insert(PaneId(id)); }

    pub fn queue_line(&self, line: &str) { self.lines.borrow_mut().push_back(line.to_string()); }
    pub fn queue_choice(&self, id: &str) { self.choices.borrow_mut().push_back(id.to_string()); }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.borrow().clone()
    }
}

impl Host for FakeHost {
    fn tabs(&self) -> Result<Vec<Tab>, HostError> {
        if self.fail_enumeration { return Err(HostError::Rejected("no server".into())); }
        Ok(self.tabs.clone())
    }

    fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        if self.fail_enumeration { return Err(HostError::Rejected("no server".into())); }
        Ok(self.active_tab.and_then(|i| self.tabs.get(i).cloned()))
    }

    fn title(&self, pane: PaneId) -> Option<String> {
        self.panes.get(&pane).map(|p| p.title.clone())
    }

    fn process_name(&self, pane: PaneId) -> Option<String> {
        self.panes.get(&pane).map(|p| p.process.clone())
    }

    fn process_argv(&self, pane: PaneId) -> Result<Vec<String>, HostError> {
        if self.argv_fail.contains(&pane) { return Err(HostError::Unsupported("argv")); }
        Ok(self.panes.get(&pane).map(|p| p.argv.clone()).unwrap_or_default())
    }

    fn send_text(&self, pane: PaneId, text: &str) -> Result<(), HostError> {
        if self.text_fail.contains(&pane) { return Err(HostError::PaneNotFound(pane)); }
        self.sent.borrow_mut().push(Sent::Text(pane, text.to_string()));
        Ok(())
    }

    fn send_key(&self, pane: PaneId, key: &str, mods: &str) -> Result<(), HostError> {
        if self.key_fail.contains(&pane) { return Err(HostError::PaneNotFound(pane)); }
        self.sent.borrow_mut().push(Sent::Key(pane, key.to_string(), mods.to_string()));
        Ok(())
    }

    fn prompt_line<'a>(&'a self, _pane: PaneId, description: &str, done: LineDone<'a>) {
        self.prompts.borrow_mut().push(description.to_string());
        let line = self.lines.borrow_mut().pop_front();
        if let Some(line) = line { done(line); }
    }

    fn choose<'a>(&'a self, _pane: PaneId, title: &str, _choices: &[Choice], done: ChoiceDone<'a>) {
        self.prompts.borrow_mut().push(title.to_string());
        let id = self.choices.borrow_mut().pop_front();
        if let Some(id) = id { done(id); }
    }
}

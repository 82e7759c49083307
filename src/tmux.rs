//! [`Host`] for tmux and tmux-compatible servers (psmux), driven through the
//! multiplexer's command line.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::HostError;
use crate::host::{ChoiceDone, Host, LineDone};
use crate::keys::tmux_key_name;
use crate::types::{Choice, KeyDescriptor, PaneId, Tab};

/// One line per pane: window id, window active flag, pane id, pane active flag.
const PANE_FORMAT: &str = "#{window_id}\t#{window_active}\t#{pane_id}\t#{pane_active}";

#[derive(Debug, Clone)]
pub struct TmuxHost {
    program: PathBuf,
    socket: Option<String>,
}

impl TmuxHost {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), socket: None }
    }

    /// Talk to the server on socket `name` (`tmux -L name`).
    pub fn with_socket(mut self, name: impl Into<String>) -> Self {
        self.socket = Some(name.into());
        self
    }

    /// `$PANECAST_TMUX` if set, else `tmux` or `psmux` from `PATH`.
    pub fn locate() -> Result<Self, HostError> {
        if let Ok(p) = env::var("PANECAST_TMUX") {
            if !p.is_empty() { return Ok(Self::new(p)); }
        }
        for name in ["tmux", "psmux"] {
            if let Ok(path) = which::which(name) {
                return Ok(Self::new(path));
            }
        }
        Err(HostError::NotFound("tmux (or psmux) is not on PATH".into()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[&str]) -> Result<String, HostError> {
        let mut cmd = Command::new(&self.program);
        if let Some(socket) = &self.socket {
            cmd.args(["-L", socket]);
        }
        cmd.args(args);
        log::debug!("running {} {}", self.program.display(), args.join(" "));
        let out = cmd.output()?;
        if !out.status.success() {
            return Err(HostError::Command {
                command: args.first().copied().unwrap_or_default().to_string(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn display(&self, pane: PaneId, format: &str) -> Result<String, HostError> {
        let out = self.run(&["display-message", "-p", "-t", &pane.to_string(), format])?;
        Ok(out.trim_end_matches(['\r', '\n']).to_string())
    }

    fn list(&self) -> Result<Vec<(Tab, bool)>, HostError> {
        let out = self.run(&["list-panes", "-s", "-F", PANE_FORMAT])?;
        Ok(parse_pane_list(&out))
    }
}

fn parse_id(s: &str, sigil: char) -> Option<u64> {
    s.trim().strip_prefix(sigil).unwrap_or(s.trim()).parse().ok()
}

/// Group `list-panes -s -F PANE_FORMAT` output into tabs, in server order,
/// each paired with its window-active flag. Malformed lines are skipped.
pub fn parse_pane_list(output: &str) -> Vec<(Tab, bool)> {
    let mut tabs: Vec<(Tab, bool)> = Vec::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 4 { continue; }
        let (Some(win), Some(pane)) = (parse_id(parts[0], '@'), parse_id(parts[2], '%')) else { continue };
        let win_active = parts[1].trim() == "1";
        let pane_active = parts[3].trim() == "1";
        let idx = match tabs.iter().position(|(t, _)| t.id == win) {
            Some(i) => i,
            None => {
                tabs.push((Tab { id: win, ..Tab::default() }, win_active));
                tabs.len() - 1
            }
        };
        let tab = &mut tabs[idx].0;
        tab.panes.push(PaneId(pane));
        if pane_active { tab.active_pane = Some(PaneId(pane)); }
    }
    tabs
}

/// Foreground process group id (`tpgid`) from a `/proc/<pid>/stat` line.
/// The command name may contain spaces and parentheses, so fields are
/// counted from the last `)`.
pub fn parse_tpgid(stat: &str) -> Option<i64> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(5)?.parse().ok()
}

#[cfg(target_os = "linux")]
fn foreground_argv(shell_pid: u32) -> Result<Vec<String>, HostError> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", shell_pid))?;
    let pid = match parse_tpgid(&stat) {
        Some(tpgid) if tpgid > 0 => tpgid as u32,
        _ => shell_pid,
    };
    let raw = std::fs::read(format!("/proc/{}/cmdline", pid))?;
    Ok(raw.split(|b| *b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect())
}

#[cfg(not(target_os = "linux"))]
fn foreground_argv(_shell_pid: u32) -> Result<Vec<String>, HostError> {
    Err(HostError::Unsupported("foreground process arguments"))
}

/// `send-keys` arguments typing `text` literally into `pane`. tmux reads an
/// argument ending in `;` as a command separator, so the final `;` goes out
/// as `\;`.
pub fn send_text_args(pane: PaneId, text: &str) -> Vec<String> {
    let mut args = vec!["send-keys".to_string(), "-l".to_string(), "-t".to_string(), pane.to_string()];
    if text.starts_with('-') { args.push("--".to_string()); }
    match text.strip_suffix(';') {
        Some(head) => args.push(format!("{}\\;", head)),
        None => args.push(text.to_string()),
    }
    args
}

/// Resolve a reply to a numbered choice list: a 1-based index or a choice id.
pub fn pick_choice(reply: &str, choices: &[Choice]) -> Option<String> {
    let reply = reply.trim();
    if reply.is_empty() { return None; }
    if let Ok(n) = reply.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| choices.get(i)).map(|c| c.id.clone());
    }
    choices.iter().find(|c| c.id.eq_ignore_ascii_case(reply)).map(|c| c.id.clone())
}

fn read_reply() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

impl Host for TmuxHost {
    fn tabs(&self) -> Result<Vec<Tab>, HostError> {
        Ok(self.list()?.into_iter().map(|(t, _)| t).collect())
    }

    fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        Ok(self.list()?.into_iter().find(|(_, active)| *active).map(|(t, _)| t))
    }

    fn title(&self, pane: PaneId) -> Option<String> {
        self.display(pane, "#{pane_title}").ok()
    }

    fn process_name(&self, pane: PaneId) -> Option<String> {
        self.display(pane, "#{pane_current_command}").ok()
    }

    fn process_argv(&self, pane: PaneId) -> Result<Vec<String>, HostError> {
        let pid = self.display(pane, "#{pane_pid}")?;
        let pid: u32 = pid.trim().parse()
            .map_err(|_| HostError::Rejected(format!("bad pane_pid '{}' for {}", pid, pane)))?;
        foreground_argv(pid)
    }

    fn send_text(&self, pane: PaneId, text: &str) -> Result<(), HostError> {
        if text.is_empty() { return Ok(()); }
        let args = send_text_args(pane, text);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).map(|_| ())
    }

    fn send_key(&self, pane: PaneId, key: &str, mods: &str) -> Result<(), HostError> {
        let name = tmux_key_name(&KeyDescriptor::new(key, mods));
        self.run(&["send-keys", "-t", &pane.to_string(), &name]).map(|_| ())
    }

    fn prompt_line<'a>(&'a self, _pane: PaneId, description: &str, done: LineDone<'a>) {
        eprint!("{}: ", description);
        let _ = io::stderr().flush();
        if let Some(line) = read_reply() {
            done(line);
        }
    }

    fn choose<'a>(&'a self, _pane: PaneId, title: &str, choices: &[Choice], done: ChoiceDone<'a>) {
        eprintln!("{}", title);
        for (i, c) in choices.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, c.label);
        }
        eprint!("> ");
        let _ = io::stderr().flush();
        if let Some(id) = read_reply().and_then(|r| pick_choice(&r, choices)) {
            done(id);
        }
    }
}

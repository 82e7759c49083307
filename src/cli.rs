use std::path::PathBuf;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::Match;
use crate::error::{Error, Result};
use crate::types::{PaneId, VERSION};

pub fn get_program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_else(|| "panecast".to_string())
        .to_lowercase()
        .replace(".exe", "")
}

pub fn print_help() {
    let prog = get_program_name();
    println!(r#"{prog} - broadcast text and submit keys to matched multiplexer panes

USAGE:
    {prog} [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    text <TEXT>...      Send text to every matched pane
    submit              Run each pane's submit action (default: Enter)
    send <TEXT>...      Send text, then submit, pane by pane
    prompt              Read a line from the terminal and send it
        --no-submit     Only send the text
        --allow-empty   Send an empty line instead of ignoring it
    menu                Choose between text, send and submit interactively
    list                Print matched panes and their targets as JSON
    help                Show this help message
    version             Show version information

OPTIONS:
    -c, --config <FILE>     Configuration file (JSON)
    -L <NAME>               tmux socket name
    -t <PANE>               Pane the prompt belongs to (default: $TMUX_PANE)
    --all-tabs              Walk every window of the session
    --active-tab            Walk only the active window (default)
    --all-panes             Take every pane of each window (default)
    --active-pane           Take only the active pane of each window
    --mode <window|text>    How submit keys are delivered
    --csi-u                 Encode modified Enter as CSI-u in text mode
    --include-unmatched     Also broadcast to panes no target matches
    -o <KEY=VALUE>          Set any configuration option
    -v, --verbose           Log matched counts and failures

ENVIRONMENT VARIABLES:
    PANECAST_CONFIG          Configuration file path
    PANECAST_TMUX            Multiplexer binary (default: tmux, then psmux)
    PANECAST_SCOPE           active_tab | all_tabs
    PANECAST_TAB_MODE        all_panes | active_pane
    PANECAST_SEND_KEY_MODE   window | text
    PANECAST_CSI_U           on | off
    PANECAST_LOG             on | off

CONFIG FILES:
    ~/.panecast.json
    ~/.config/panecast/config.json

EXAMPLES:
    {prog} send git pull                Type 'git pull' and Enter in all panes
    {prog} --all-tabs text 'y'          Type 'y' in every pane of the session
    {prog} -o match-fields=process list Show which panes would be targeted
"#, prog = prog);
}

pub fn print_version() {
    let prog = get_program_name();
    println!("{} {}", prog, VERSION);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Text(String),
    Submit,
    Send(String),
    Prompt { submit: bool, allow_empty: bool },
    Menu,
    List,
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: CliCommand,
    pub config: Option<PathBuf>,
    pub socket: Option<String>,
    pub pane: Option<PaneId>,
    /// `(key, value)` options applied on top of the configuration, in order.
    pub options: Vec<(String, String)>,
    pub verbose: bool,
}

/// Parse a pane reference: `%12` or `12`.
pub fn parse_pane(s: &str) -> Option<PaneId> {
    s.trim().strip_prefix('%').unwrap_or(s.trim()).parse().ok().map(PaneId)
}

fn usage(msg: impl Into<String>) -> Error {
    Error::Usage(msg.into())
}

/// Parse command-line arguments (without the program name). Options may
/// appear anywhere before the text of `text`/`send`; everything after the
/// command name that is not an option is text, joined with spaces.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut config = None;
    let mut socket = None;
    let mut pane = None;
    let mut options = Vec::new();
    let mut verbose = false;
    let mut submit = true;
    let mut allow_empty = false;
    let mut command: Option<String> = None;
    let mut words: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        // Once text has started, everything is text (so `send -- -rf` works too).
        if !words.is_empty() || arg == "--" {
            if arg != "--" || !words.is_empty() { words.push(arg.to_string()); }
            else { words.extend(args[i + 1..].iter().cloned()); break; }
            i += 1;
            continue;
        }
        let mut value = |name: &str| -> Result<String> {
            i += 1;
            args.get(i).cloned().ok_or_else(|| usage(format!("{} requires a value", name)))
        };
        match arg {
            "-c" | "--config" => config = Some(PathBuf::from(value(arg)?)),
            "-L" => socket = Some(value(arg)?),
            "-t" => {
                let v = value(arg)?;
                pane = Some(parse_pane(&v).ok_or_else(|| usage(format!("invalid pane '{}'", v)))?);
            }
            "-o" => {
                let v = value(arg)?;
                let (k, val) = v.split_once('=').ok_or_else(|| usage(format!("expected KEY=VALUE, got '{}'", v)))?;
                options.push((k.to_string(), val.to_string()));
            }
            "--mode" => options.push(("send-key-mode".into(), value(arg)?)),
            "--all-tabs" => options.push(("scope".into(), "all_tabs".into())),
            "--active-tab" => options.push(("scope".into(), "active_tab".into())),
            "--all-panes" => options.push(("tab-mode".into(), "all_panes".into())),
            "--active-pane" => options.push(("tab-mode".into(), "active_pane".into())),
            "--csi-u" => options.push(("csi-u".into(), "on".into())),
            "--include-unmatched" => options.push(("include-unmatched".into(), "on".into())),
            "--no-submit" => submit = false,
            "--allow-empty" => allow_empty = true,
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => command = Some("help".into()),
            "-V" | "--version" => command = Some("version".into()),
            s if s.starts_with('-') && s.len() > 1 => return Err(usage(format!("unknown option '{}'", s))),
            s if command.is_none() => command = Some(s.to_string()),
            s => words.push(s.to_string()),
        }
        i += 1;
    }

    let text = words.join(" ");
    let command = match command.as_deref() {
        None | Some("help") => CliCommand::Help,
        Some("version") => CliCommand::Version,
        Some("text") if !text.is_empty() => CliCommand::Text(text),
        Some("send") if !text.is_empty() => CliCommand::Send(text),
        Some("text") | Some("send") => return Err(usage("missing text to send")),
        Some("submit") => CliCommand::Submit,
        Some("prompt") => CliCommand::Prompt { submit, allow_empty },
        Some("menu") => CliCommand::Menu,
        Some("list") | Some("ls") => CliCommand::List,
        Some(other) => return Err(usage(format!("unknown command '{}'", other))),
    };
    Ok(CliArgs { command, config, socket, pane, options, verbose })
}

/// Apply the command-line options and `-v` to a loaded configuration.
pub fn apply_cli_options(config: &mut EngineConfig, cli: &CliArgs) -> Result<()> {
    for (key, value) in &cli.options {
        config.set_option(key, value)?;
    }
    if cli.verbose { config.log = true; }
    Ok(())
}

#[derive(Serialize)]
struct MatchInfo<'a> {
    pane: PaneId,
    target: &'a str,
}

pub fn matches_json(matches: &[Match]) -> Result<String> {
    let v: Vec<MatchInfo> = matches.iter()
        .map(|m| MatchInfo { pane: m.pane, target: &m.target.name })
        .collect();
    Ok(serde_json::to_string(&v)?)
}

use std::env;
use std::process;

use panecast::cli::{self, CliArgs, CliCommand};
use panecast::config::{apply_env_overrides, load_config, load_config_from};
use panecast::error::{Error, Result};
use panecast::{Engine, PaneId, PromptOptions, TmuxHost};

const MENU_TITLE: &str = "Broadcast";

fn run(cli: CliArgs) -> Result<()> {
    match cli.command {
        CliCommand::Help => { cli::print_help(); return Ok(()); }
        CliCommand::Version => { cli::print_version(); return Ok(()); }
        _ => {}
    }

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_env_overrides(&mut config, |k| env::var(k).ok());
    cli::apply_cli_options(&mut config, &cli)?;

    let mut host = TmuxHost::locate()?;
    if let Some(socket) = &cli.socket {
        host = host.with_socket(socket.clone());
    }
    let pane = cli.pane
        .or_else(|| env::var("TMUX_PANE").ok().and_then(|p| cli::parse_pane(&p)))
        .unwrap_or(PaneId(0));

    log::debug!("multiplexer: {}", host.program().display());

    let engine = Engine::new(config);
    log::debug!("config: {:?}", engine.config());
    match cli.command {
        CliCommand::Text(text) => { engine.broadcast_text(&host, &text); }
        CliCommand::Submit => { engine.broadcast_submit(&host); }
        CliCommand::Send(text) => { engine.broadcast_text_and_submit(&host, &text); }
        CliCommand::Prompt { submit, allow_empty } => {
            let options = PromptOptions { submit, allow_empty, ..PromptOptions::default() };
            engine.prompt_and_broadcast(&host, pane, &options);
        }
        CliCommand::Menu => engine.menu_and_broadcast(&host, pane, MENU_TITLE),
        CliCommand::List => {
            let matches = engine.resolve_matches(&host);
            println!("{}", cli::matches_json(&matches)?);
        }
        CliCommand::Help | CliCommand::Version => {}
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match cli::parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", cli::get_program_name(), e);
            eprintln!("Try '{} help' for usage.", cli::get_program_name());
            process::exit(2);
        }
    };

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", cli::get_program_name(), e);
        process::exit(if matches!(e, Error::Usage(_)) { 2 } else { 1 });
    }
}

use crate::host::Host;
use crate::types::{Context, PaneId};

/// Build the matchable context of `pane`. Missing values become empty
/// strings; a failed argv lookup is expected (the process may be gone) and
/// yields an empty `argv` without logging.
pub fn extract(host: &dyn Host, pane: PaneId) -> Context {
    let title = host.title(pane).unwrap_or_default().to_lowercase();
    let process = host.process_name(pane).unwrap_or_default().to_lowercase();
    let argv = host.process_argv(pane)
        .map(|args| args.join(" ").to_lowercase())
        .unwrap_or_default();
    Context { title, process, argv }
}

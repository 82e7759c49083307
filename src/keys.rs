//! Key descriptor handling: modifier parsing, raw encodings for
//! `send_key_mode = text`, and tmux key names for the host key action.

use crossterm::event::KeyModifiers;

use crate::types::KeyDescriptor;

/// Parse a `|`-delimited modifier list. Case-insensitive, unknown tokens are
/// ignored.
pub fn parse_mods(mods: &str) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    for token in mods.split('|') {
        match token.trim().to_uppercase().as_str() {
            "SHIFT" => out |= KeyModifiers::SHIFT,
            "ALT" | "OPT" => out |= KeyModifiers::ALT,
            "CTRL" | "CONTROL" => out |= KeyModifiers::CONTROL,
            "META" => out |= KeyModifiers::META,
            _ => {}
        }
    }
    out
}

/// xterm-style modifier parameter: 1 plus Shift=1, Alt=2, Ctrl=4, Meta=8,
/// summed over every token of the `|`-delimited list. A repeated token
/// counts each time it appears.
pub fn modifier_mask(mods: &str) -> u32 {
    mods.split('|')
        .map(|token| match token.trim().to_uppercase().as_str() {
            "SHIFT" => 1,
            "ALT" | "OPT" => 2,
            "CTRL" | "CONTROL" => 4,
            "META" => 8,
            _ => 0,
        })
        .fold(1, |mask, bit| mask + bit)
}

fn is_enter(key: &str) -> bool {
    key.eq_ignore_ascii_case("enter") || key.eq_ignore_ascii_case("return")
}

/// Textual encoding of `desc`, or `None` when only a host key action can
/// deliver it.
///
/// Only Enter is encoded. A modified Enter becomes `ESC [ 13 ; <mask> u`
/// with `csi_u`; without it the modifiers are dropped and a plain `\r` is
/// sent.
pub fn encode(desc: &KeyDescriptor, csi_u: bool) -> Option<String> {
    if !is_enter(&desc.key) { return None; }
    let mask = modifier_mask(&desc.mods);
    if mask == 1 || !csi_u {
        return Some("\r".to_string());
    }
    Some(format!("\x1b[13;{}u", mask))
}

/// tmux `send-keys` name for `desc`, e.g. `C-M-Enter`.
/// tmux has no separate Meta modifier, it folds into `M-`.
pub fn tmux_key_name(desc: &KeyDescriptor) -> String {
    let mods = parse_mods(&desc.mods);
    let mut result = String::new();
    if mods.contains(KeyModifiers::CONTROL) {
        result.push_str("C-");
    }
    if mods.intersects(KeyModifiers::ALT | KeyModifiers::META) {
        result.push_str("M-");
    }
    if mods.contains(KeyModifiers::SHIFT) {
        result.push_str("S-");
    }
    let key = desc.key.trim();
    let name = match key.to_lowercase().as_str() {
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "escape" | "esc" => "Escape",
        "space" => "Space",
        "backspace" | "bspace" => "BSpace",
        "delete" | "del" => "DC",
        "insert" => "IC",
        "up" | "uparrow" => "Up",
        "down" | "downarrow" => "Down",
        "left" | "leftarrow" => "Left",
        "right" | "rightarrow" => "Right",
        "home" => "Home",
        "end" => "End",
        "pageup" => "PPage",
        "pagedown" => "NPage",
        _ => key,
    };
    result.push_str(name);
    result
}

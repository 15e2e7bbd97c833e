// ABOUTME: Translation of crossterm key events into terminal input units
// Produces the same strings an xterm-compatible widget hands to its data callback

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Translate a key event into the input unit a terminal widget would emit.
///
/// Returns `None` for key releases and keys with no byte representation.
pub fn key_to_data(key: KeyEvent) -> Option<String> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let data = match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return control_char(c).map(String::from);
            } else if key.modifiers.contains(KeyModifiers::ALT) {
                format!("\u{1b}{c}")
            } else {
                c.to_string()
            }
        }
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::BackTab => "\u{1b}[Z".to_string(),
        KeyCode::Backspace => "\u{7f}".to_string(),
        KeyCode::Esc => "\u{1b}".to_string(),
        KeyCode::Up => "\u{1b}[A".to_string(),
        KeyCode::Down => "\u{1b}[B".to_string(),
        KeyCode::Right => "\u{1b}[C".to_string(),
        KeyCode::Left => "\u{1b}[D".to_string(),
        KeyCode::Home => "\u{1b}[H".to_string(),
        KeyCode::End => "\u{1b}[F".to_string(),
        KeyCode::PageUp => "\u{1b}[5~".to_string(),
        KeyCode::PageDown => "\u{1b}[6~".to_string(),
        KeyCode::Delete => "\u{1b}[3~".to_string(),
        KeyCode::Insert => "\u{1b}[2~".to_string(),
        KeyCode::F(n) => function_key(n)?.to_string(),
        _ => return None,
    };

    Some(data)
}

/// Ctrl+key maps onto the C0 range; only keys with a C0 counterpart qualify
fn control_char(c: char) -> Option<char> {
    match c.to_ascii_lowercase() {
        ' ' | '@' | '2' => Some('\0'),
        c @ 'a'..='z' => Some(((c as u8) & 0x1f) as char),
        c @ ('[' | '\\' | ']' | '^' | '_') => Some(((c as u8) & 0x1f) as char),
        _ => None,
    }
}

fn function_key(n: u8) -> Option<&'static str> {
    let seq = match n {
        1 => "\u{1b}OP",
        2 => "\u{1b}OQ",
        3 => "\u{1b}OR",
        4 => "\u{1b}OS",
        5 => "\u{1b}[15~",
        6 => "\u{1b}[17~",
        7 => "\u{1b}[18~",
        8 => "\u{1b}[19~",
        9 => "\u{1b}[20~",
        10 => "\u{1b}[21~",
        11 => "\u{1b}[23~",
        12 => "\u{1b}[24~",
        _ => return None,
    };
    Some(seq)
}

/// Ctrl+Q ends the session; checked before translation so it never reaches the line
pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
}

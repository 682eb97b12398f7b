//! Input encoding: turns abstract key, paste, and mouse events into the
//! byte sequences a child process expects on stdin, honoring the engine's
//! mode state (application cursor keys, bracketed paste, mouse protocol).

use bitflags::bitflags;

use crate::terminal::modes::TerminalModes;

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const META  = 1 << 3;
    }
}

impl Modifiers {
    /// xterm's modifier parameter: 1 + bitmask.
    fn xterm_code(self) -> u8 {
        1 + (self.bits() & 0x0f)
    }
}

/// Abstract key identity delivered by the input front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Up,
    Down,
    Right,
    Left,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Motion,
}

/// A mouse event with 0-indexed cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub button: MouseButton,
    pub col: u16,
    pub row: u16,
    pub mods: Modifiers,
}

/// Encode a key event. Unencodable combinations yield an empty vector.
pub fn encode_key(key: Key, mods: Modifiers, modes: &TerminalModes) -> Vec<u8> {
    match key {
        Key::Up => cursor_key(b'A', mods, modes),
        Key::Down => cursor_key(b'B', mods, modes),
        Key::Right => cursor_key(b'C', mods, modes),
        Key::Left => cursor_key(b'D', mods, modes),
        Key::Home => cursor_key(b'H', mods, modes),
        Key::End => cursor_key(b'F', mods, modes),
        Key::Insert => tilde_key(2, mods),
        Key::Delete => tilde_key(3, mods),
        Key::PageUp => tilde_key(5, mods),
        Key::PageDown => tilde_key(6, mods),
        Key::F(n) => function_key(n, mods),
        Key::Enter => with_alt_prefix(mods, vec![b'\r']),
        Key::Tab => {
            if mods.contains(Modifiers::SHIFT) {
                b"\x1b[Z".to_vec()
            } else {
                with_alt_prefix(mods, vec![b'\t'])
            }
        }
        Key::Backspace => with_alt_prefix(mods, vec![0x7f]),
        Key::Escape => with_alt_prefix(mods, vec![0x1b]),
        Key::Char(c) => character(c, mods),
    }
}

fn with_alt_prefix(mods: Modifiers, mut bytes: Vec<u8>) -> Vec<u8> {
    if mods.contains(Modifiers::ALT) {
        bytes.insert(0, 0x1b);
    }
    bytes
}

/// Arrow/Home/End: `SS3 X` in application cursor-key mode, `CSI X`
/// otherwise; modifiers always force the `CSI 1 ; m X` form.
fn cursor_key(final_byte: u8, mods: Modifiers, modes: &TerminalModes) -> Vec<u8> {
    if mods.is_empty() {
        if modes.cursor_keys_application {
            vec![0x1b, b'O', final_byte]
        } else {
            vec![0x1b, b'[', final_byte]
        }
    } else {
        format!("\x1b[1;{}{}", mods.xterm_code(), final_byte as char).into_bytes()
    }
}

fn tilde_key(code: u8, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{}~", code).into_bytes()
    } else {
        format!("\x1b[{};{}~", code, mods.xterm_code()).into_bytes()
    }
}

fn function_key(n: u8, mods: Modifiers) -> Vec<u8> {
    match n {
        1..=4 => {
            let final_byte = b'P' + (n - 1);
            if mods.is_empty() {
                vec![0x1b, b'O', final_byte]
            } else {
                format!("\x1b[1;{}{}", mods.xterm_code(), final_byte as char).into_bytes()
            }
        }
        5..=20 => {
            let code = match n {
                5 => 15,
                6 => 17,
                7 => 18,
                8 => 19,
                9 => 20,
                10 => 21,
                11 => 23,
                12 => 24,
                13 => 25,
                14 => 26,
                15 => 28,
                16 => 29,
                17 => 31,
                18 => 32,
                19 => 33,
                _ => 34,
            };
            tilde_key(code, mods)
        }
        _ => Vec::new(),
    }
}

fn character(c: char, mods: Modifiers) -> Vec<u8> {
    if mods.contains(Modifiers::CTRL) && c.is_ascii() {
        let byte = match c {
            ' ' | '@' => 0x00,
            '?' => 0x7f,
            _ => (c.to_ascii_uppercase() as u8) & 0x1f,
        };
        return with_alt_prefix(mods, vec![byte]);
    }
    let mut buf = [0u8; 4];
    with_alt_prefix(mods, c.encode_utf8(&mut buf).as_bytes().to_vec())
}

/// Encode pasted text. With bracketed paste the body is wrapped in
/// `CSI 200 ~` / `CSI 201 ~`, and any embedded end marker has its ESC
/// stripped so the child cannot be broken out of the paste body.
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    if !bracketed {
        return text.as_bytes().to_vec();
    }
    let body = text.replace("\x1b[201~", "[201~");
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(b"\x1b[200~");
    out.extend_from_slice(body.as_bytes());
    out.extend_from_slice(b"\x1b[201~");
    out
}

/// Encode a mouse event per the active protocol. Returns an empty vector
/// when no mouse mode is on or the event kind is not reported.
pub fn encode_mouse(event: &MouseEvent, modes: &TerminalModes) -> Vec<u8> {
    if !modes.mouse_reporting() {
        return Vec::new();
    }
    if event.kind == MouseEventKind::Motion && !modes.mouse_motion && !modes.mouse_all_motion {
        return Vec::new();
    }

    let mut code: u8 = match event.button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::WheelUp => 64,
        MouseButton::WheelDown => 65,
    };
    if event.mods.contains(Modifiers::SHIFT) {
        code += 4;
    }
    if event.mods.intersects(Modifiers::ALT | Modifiers::META) {
        code += 8;
    }
    if event.mods.contains(Modifiers::CTRL) {
        code += 16;
    }
    if event.kind == MouseEventKind::Motion {
        code += 32;
    }

    if modes.sgr_mouse {
        let suffix = if event.kind == MouseEventKind::Release {
            'm'
        } else {
            'M'
        };
        format!(
            "\x1b[<{};{};{}{}",
            code,
            event.col + 1,
            event.row + 1,
            suffix
        )
        .into_bytes()
    } else {
        // Legacy encoding: release loses button identity, coordinates are
        // offset by 32 and clamped to 223.
        let code = if event.kind == MouseEventKind::Release {
            (code & !0x03) | 3
        } else {
            code
        };
        let x = (event.col + 1).min(223) as u8;
        let y = (event.row + 1).min(223) as u8;
        vec![0x1b, b'[', b'M', 32 + code, 32 + x, 32 + y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_modes() -> TerminalModes {
        TerminalModes::default()
    }

    #[test]
    fn arrows_normal_and_application() {
        let mut modes = normal_modes();
        assert_eq!(encode_key(Key::Up, Modifiers::empty(), &modes), b"\x1b[A");
        modes.cursor_keys_application = true;
        assert_eq!(encode_key(Key::Up, Modifiers::empty(), &modes), b"\x1bOA");
    }

    #[test]
    fn modified_arrow_uses_csi_form() {
        let mut modes = normal_modes();
        modes.cursor_keys_application = true;
        assert_eq!(
            encode_key(Key::Right, Modifiers::CTRL, &modes),
            b"\x1b[1;5C"
        );
        assert_eq!(
            encode_key(Key::Up, Modifiers::SHIFT | Modifiers::ALT, &modes),
            b"\x1b[1;4A"
        );
    }

    #[test]
    fn function_keys() {
        let modes = normal_modes();
        assert_eq!(encode_key(Key::F(1), Modifiers::empty(), &modes), b"\x1bOP");
        assert_eq!(
            encode_key(Key::F(1), Modifiers::SHIFT, &modes),
            b"\x1b[1;2P"
        );
        assert_eq!(
            encode_key(Key::F(5), Modifiers::empty(), &modes),
            b"\x1b[15~"
        );
        assert_eq!(
            encode_key(Key::F(12), Modifiers::CTRL, &modes),
            b"\x1b[24;5~"
        );
    }

    #[test]
    fn editing_keys() {
        let modes = normal_modes();
        assert_eq!(
            encode_key(Key::Delete, Modifiers::empty(), &modes),
            b"\x1b[3~"
        );
        assert_eq!(
            encode_key(Key::PageUp, Modifiers::empty(), &modes),
            b"\x1b[5~"
        );
        assert_eq!(
            encode_key(Key::Tab, Modifiers::SHIFT, &modes),
            b"\x1b[Z"
        );
    }

    #[test]
    fn control_characters() {
        let modes = normal_modes();
        assert_eq!(
            encode_key(Key::Char('c'), Modifiers::CTRL, &modes),
            vec![0x03]
        );
        assert_eq!(
            encode_key(Key::Char(' '), Modifiers::CTRL, &modes),
            vec![0x00]
        );
        assert_eq!(
            encode_key(Key::Char('x'), Modifiers::ALT, &modes),
            vec![0x1b, b'x']
        );
        assert_eq!(
            encode_key(Key::Char('é'), Modifiers::empty(), &modes),
            "é".as_bytes().to_vec()
        );
    }

    #[test]
    fn paste_raw_without_bracketing() {
        assert_eq!(encode_paste("hi", false), b"hi");
    }

    #[test]
    fn paste_bracketed_and_neutralized() {
        assert_eq!(
            encode_paste("hello", true),
            b"\x1b[200~hello\x1b[201~".to_vec()
        );
        let out = encode_paste("bad\x1b[201~tail", true);
        let body = &out[6..out.len() - 6];
        assert_eq!(body, b"bad[201~tail");
    }

    #[test]
    fn mouse_requires_reporting_mode() {
        let modes = normal_modes();
        let event = MouseEvent {
            kind: MouseEventKind::Press,
            button: MouseButton::Left,
            col: 0,
            row: 0,
            mods: Modifiers::empty(),
        };
        assert!(encode_mouse(&event, &modes).is_empty());
    }

    #[test]
    fn mouse_sgr_press_and_release() {
        let mut modes = normal_modes();
        modes.mouse_tracking = true;
        modes.sgr_mouse = true;
        let mut event = MouseEvent {
            kind: MouseEventKind::Press,
            button: MouseButton::Left,
            col: 4,
            row: 9,
            mods: Modifiers::empty(),
        };
        assert_eq!(encode_mouse(&event, &modes), b"\x1b[<0;5;10M");
        event.kind = MouseEventKind::Release;
        assert_eq!(encode_mouse(&event, &modes), b"\x1b[<0;5;10m");
    }

    #[test]
    fn mouse_legacy_clamps_coordinates() {
        let mut modes = normal_modes();
        modes.mouse_tracking = true;
        let event = MouseEvent {
            kind: MouseEventKind::Press,
            button: MouseButton::Left,
            col: 500,
            row: 2,
            mods: Modifiers::empty(),
        };
        assert_eq!(
            encode_mouse(&event, &modes),
            vec![0x1b, b'[', b'M', 32, 32 + 223, 32 + 3]
        );
    }

    #[test]
    fn mouse_legacy_release_code() {
        let mut modes = normal_modes();
        modes.mouse_tracking = true;
        let event = MouseEvent {
            kind: MouseEventKind::Release,
            button: MouseButton::Right,
            col: 0,
            row: 0,
            mods: Modifiers::empty(),
        };
        assert_eq!(
            encode_mouse(&event, &modes),
            vec![0x1b, b'[', b'M', 32 + 3, 33, 33]
        );
    }

    #[test]
    fn mouse_motion_gated_by_motion_modes() {
        let mut modes = normal_modes();
        modes.mouse_tracking = true;
        let event = MouseEvent {
            kind: MouseEventKind::Motion,
            button: MouseButton::Left,
            col: 1,
            row: 1,
            mods: Modifiers::empty(),
        };
        assert!(encode_mouse(&event, &modes).is_empty());
        modes.mouse_motion = true;
        modes.sgr_mouse = true;
        assert_eq!(encode_mouse(&event, &modes), b"\x1b[<32;2;2M");
    }

    #[test]
    fn wheel_encodes_as_button_64() {
        let mut modes = normal_modes();
        modes.mouse_tracking = true;
        modes.sgr_mouse = true;
        let event = MouseEvent {
            kind: MouseEventKind::Press,
            button: MouseButton::WheelUp,
            col: 0,
            row: 0,
            mods: Modifiers::empty(),
        };
        assert_eq!(encode_mouse(&event, &modes), b"\x1b[<64;1;1M");
    }
}

//! OSC classifier: splits a raw OSC payload into a typed command.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscCommand {
    /// OSC 0: set both window title and icon name.
    SetTitleAndIcon(String),
    /// OSC 1: set icon name.
    SetIcon(String),
    /// OSC 2: set window title.
    SetTitle(String),
    /// OSC 4 with a color spec: set a palette entry.
    SetPaletteColor { index: u8, rgb: (u8, u8, u8) },
    /// OSC 4 with `?`: query a palette entry.
    QueryPaletteColor { index: u8 },
    /// OSC 8 with a non-empty URI: open a hyperlink. `id` is the optional
    /// `id=` key from the parameter list.
    Hyperlink { id: Option<String>, uri: String },
    /// OSC 8 with an empty URI: close the current hyperlink.
    HyperlinkEnd,
    /// OSC 10 / 11 with `?`.
    QueryDefaultForeground,
    QueryDefaultBackground,
    /// OSC 21: query the window title.
    QueryTitle,
    /// OSC 52 with a base64 body: write the clipboard selection.
    ClipboardSet { selection: String, data: Vec<u8> },
    /// OSC 52 with `?`: ask for the clipboard contents.
    ClipboardQuery { selection: String },
    /// OSC 52 with an empty body: clear the selection.
    ClipboardClear { selection: String },
    /// Command numbers >= 1000 are reserved for the host RPC channel.
    Private { command: u32, payload: Vec<u8> },
    Unrecognized,
}

/// Classify a raw OSC payload (terminator already stripped).
pub fn classify(payload: &[u8]) -> OscCommand {
    let (number, rest) = split_number(payload);
    let Some(number) = number else {
        return OscCommand::Unrecognized;
    };

    if number >= 1000 {
        return OscCommand::Private {
            command: number,
            payload: rest.to_vec(),
        };
    }

    match number {
        0 => OscCommand::SetTitleAndIcon(lossy(rest)),
        1 => OscCommand::SetIcon(lossy(rest)),
        2 => OscCommand::SetTitle(lossy(rest)),
        4 => classify_palette(rest),
        8 => classify_hyperlink(rest),
        10 if rest == b"?" => OscCommand::QueryDefaultForeground,
        11 if rest == b"?" => OscCommand::QueryDefaultBackground,
        21 => OscCommand::QueryTitle,
        52 => classify_clipboard(rest),
        _ => OscCommand::Unrecognized,
    }
}

/// Split the leading command number from the payload. The separating `;` is
/// consumed; a payload without one is all number.
fn split_number(payload: &[u8]) -> (Option<u32>, &[u8]) {
    let end = payload
        .iter()
        .position(|&b| b == b';')
        .unwrap_or(payload.len());
    let number = std::str::from_utf8(&payload[..end])
        .ok()
        .and_then(|s| s.parse::<u32>().ok());
    let rest = if end < payload.len() {
        &payload[end + 1..]
    } else {
        &[]
    };
    (number, rest)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn classify_palette(rest: &[u8]) -> OscCommand {
    let text = lossy(rest);
    let mut parts = text.splitn(2, ';');
    let Some(index) = parts.next().and_then(|s| s.parse::<u8>().ok()) else {
        return OscCommand::Unrecognized;
    };
    match parts.next() {
        Some("?") => OscCommand::QueryPaletteColor { index },
        Some(spec) => match parse_color_spec(spec) {
            Some(rgb) => OscCommand::SetPaletteColor { index, rgb },
            None => OscCommand::Unrecognized,
        },
        None => OscCommand::Unrecognized,
    }
}

/// Parse an X-style color spec: `rgb:RR/GG/BB` (1-4 hex digits per
/// component) or `#rrggbb`.
pub fn parse_color_spec(spec: &str) -> Option<(u8, u8, u8)> {
    if let Some(body) = spec.strip_prefix("rgb:") {
        let mut parts = body.split('/');
        let r = scale_hex(parts.next()?)?;
        let g = scale_hex(parts.next()?)?;
        let b = scale_hex(parts.next()?)?;
        return Some((r, g, b));
    }
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some((r, g, b));
        }
    }
    None
}

/// Scale a 1-4 digit hex component to 8 bits.
fn scale_hex(component: &str) -> Option<u8> {
    if component.is_empty() || component.len() > 4 {
        return None;
    }
    let value = u16::from_str_radix(component, 16).ok()?;
    let max = (1u32 << (4 * component.len() as u32)) - 1;
    Some(((u32::from(value) * 255 + max / 2) / max) as u8)
}

fn classify_hyperlink(rest: &[u8]) -> OscCommand {
    let text = lossy(rest);
    let mut parts = text.splitn(2, ';');
    let params = parts.next().unwrap_or("");
    let uri = parts.next().unwrap_or("");
    if uri.is_empty() {
        return OscCommand::HyperlinkEnd;
    }
    let id = params.split(':').find_map(|kv| {
        kv.strip_prefix("id=")
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    });
    OscCommand::Hyperlink {
        id,
        uri: uri.to_string(),
    }
}

fn classify_clipboard(rest: &[u8]) -> OscCommand {
    let text = lossy(rest);
    let mut parts = text.splitn(2, ';');
    let selection = parts.next().unwrap_or("c").to_string();
    let selection = if selection.is_empty() {
        "c".to_string()
    } else {
        selection
    };
    match parts.next() {
        Some("?") => OscCommand::ClipboardQuery { selection },
        Some("") | None => OscCommand::ClipboardClear { selection },
        Some(body) => match BASE64_STANDARD.decode(body.as_bytes()) {
            Ok(data) => OscCommand::ClipboardSet { selection, data },
            Err(_) => OscCommand::ClipboardClear { selection },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles() {
        assert_eq!(
            classify(b"0;hello"),
            OscCommand::SetTitleAndIcon("hello".into())
        );
        assert_eq!(classify(b"2;title"), OscCommand::SetTitle("title".into()));
        assert_eq!(classify(b"1;icon"), OscCommand::SetIcon("icon".into()));
    }

    #[test]
    fn palette_query_and_set() {
        assert_eq!(
            classify(b"4;17;?"),
            OscCommand::QueryPaletteColor { index: 17 }
        );
        assert_eq!(
            classify(b"4;1;rgb:ff/00/80"),
            OscCommand::SetPaletteColor {
                index: 1,
                rgb: (255, 0, 128)
            }
        );
        assert_eq!(
            classify(b"4;2;#102030"),
            OscCommand::SetPaletteColor {
                index: 2,
                rgb: (16, 32, 48)
            }
        );
    }

    #[test]
    fn four_digit_rgb_components_scale() {
        assert_eq!(parse_color_spec("rgb:ffff/0000/8080"), Some((255, 0, 128)));
    }

    #[test]
    fn hyperlink_open_and_close() {
        assert_eq!(
            classify(b"8;id=x1;https://example.com"),
            OscCommand::Hyperlink {
                id: Some("x1".into()),
                uri: "https://example.com".into()
            }
        );
        assert_eq!(
            classify(b"8;;https://example.com"),
            OscCommand::Hyperlink {
                id: None,
                uri: "https://example.com".into()
            }
        );
        assert_eq!(classify(b"8;;"), OscCommand::HyperlinkEnd);
    }

    #[test]
    fn clipboard_forms() {
        assert_eq!(
            classify(b"52;c;aGVsbG8="),
            OscCommand::ClipboardSet {
                selection: "c".into(),
                data: b"hello".to_vec()
            }
        );
        assert_eq!(
            classify(b"52;p;?"),
            OscCommand::ClipboardQuery {
                selection: "p".into()
            }
        );
        assert_eq!(
            classify(b"52;c;"),
            OscCommand::ClipboardClear {
                selection: "c".into()
            }
        );
    }

    #[test]
    fn queries() {
        assert_eq!(classify(b"10;?"), OscCommand::QueryDefaultForeground);
        assert_eq!(classify(b"11;?"), OscCommand::QueryDefaultBackground);
        assert_eq!(classify(b"21"), OscCommand::QueryTitle);
    }

    #[test]
    fn private_range() {
        assert_eq!(
            classify(b"1010;{\"action\":\"ping\"}"),
            OscCommand::Private {
                command: 1010,
                payload: b"{\"action\":\"ping\"}".to_vec()
            }
        );
    }

    #[test]
    fn garbage_is_unrecognized() {
        assert_eq!(classify(b"nope;x"), OscCommand::Unrecognized);
        assert_eq!(classify(b"777;x"), OscCommand::Unrecognized);
    }
}

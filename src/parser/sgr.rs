//! SGR classifier: turns a parameter list into a list of attribute deltas.
//!
//! Extended colors accept both the semicolon form (`38;2;r;g;b`,
//! `38;5;n`) and the colon sub-parameter form (`38:2::r:g:b`, `38:5:n`).
//! Underline styles accept `4:0` through `4:5`.

use super::Params;
use crate::terminal::cell::UnderlineStyle;
use crate::terminal::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrDelta {
    ResetAll,
    SetBold,
    SetFaint,
    UnsetBoldFaint,
    SetItalic,
    UnsetItalic,
    SetUnderline(UnderlineStyle),
    SetBlink,
    SetRapidBlink,
    UnsetBlink,
    SetInverse,
    UnsetInverse,
    SetHidden,
    UnsetHidden,
    SetStrikethrough,
    UnsetStrikethrough,
    SetFg(Color),
    SetBg(Color),
    SetUnderlineColor(Color),
}

/// Classify an SGR parameter list. An empty list means reset.
pub fn classify(params: &Params) -> Vec<AttrDelta> {
    use AttrDelta::*;

    if params.is_empty() {
        return vec![ResetAll];
    }

    let mut deltas = Vec::new();
    let mut i = 0;
    while i < params.len() {
        let sub = params.subparams(i);
        let code = sub.first().copied().unwrap_or(0);
        match code {
            0 => deltas.push(ResetAll),
            1 => deltas.push(SetBold),
            2 => deltas.push(SetFaint),
            3 => deltas.push(SetItalic),
            4 => deltas.push(SetUnderline(underline_style(sub.get(1).copied()))),
            5 => deltas.push(SetBlink),
            6 => deltas.push(SetRapidBlink),
            7 => deltas.push(SetInverse),
            8 => deltas.push(SetHidden),
            9 => deltas.push(SetStrikethrough),
            21 => deltas.push(SetUnderline(UnderlineStyle::Double)),
            22 => deltas.push(UnsetBoldFaint),
            23 => deltas.push(UnsetItalic),
            24 => deltas.push(SetUnderline(UnderlineStyle::None)),
            25 => deltas.push(UnsetBlink),
            27 => deltas.push(UnsetInverse),
            28 => deltas.push(UnsetHidden),
            29 => deltas.push(UnsetStrikethrough),
            30..=37 => deltas.push(SetFg(Color::indexed(code as u8 - 30))),
            38 => {
                if let Some((color, consumed)) = extended_color(params, i) {
                    deltas.push(SetFg(color));
                    i += consumed;
                }
            }
            39 => deltas.push(SetFg(Color::Default)),
            40..=47 => deltas.push(SetBg(Color::indexed(code as u8 - 40))),
            48 => {
                if let Some((color, consumed)) = extended_color(params, i) {
                    deltas.push(SetBg(color));
                    i += consumed;
                }
            }
            49 => deltas.push(SetBg(Color::Default)),
            58 => {
                if let Some((color, consumed)) = extended_color(params, i) {
                    deltas.push(SetUnderlineColor(color));
                    i += consumed;
                }
            }
            59 => deltas.push(SetUnderlineColor(Color::Default)),
            90..=97 => deltas.push(SetFg(Color::indexed(code as u8 - 90 + 8))),
            100..=107 => deltas.push(SetBg(Color::indexed(code as u8 - 100 + 8))),
            _ => {}
        }
        i += 1;
    }
    deltas
}

fn underline_style(kind: Option<u16>) -> UnderlineStyle {
    match kind {
        None | Some(1) => UnderlineStyle::Single,
        Some(0) => UnderlineStyle::None,
        Some(2) => UnderlineStyle::Double,
        Some(3) => UnderlineStyle::Curly,
        Some(4) => UnderlineStyle::Dotted,
        Some(5) => UnderlineStyle::Dashed,
        Some(_) => UnderlineStyle::Single,
    }
}

/// Parse the extended color introduced by parameter `i` (38/48/58).
/// Returns the color and how many *extra* parameters were consumed
/// (0 for the colon form, which lives inside a single parameter).
fn extended_color(params: &Params, i: usize) -> Option<(Color, usize)> {
    let sub = params.subparams(i);
    if sub.len() > 1 {
        // Colon form: 38:5:n, 38:2:r:g:b, or 38:2:<colorspace>:r:g:b.
        match *sub.get(1)? {
            5 => {
                let n = *sub.get(2)?;
                Some((Color::indexed(n as u8), 0))
            }
            2 => {
                let tail = &sub[2..];
                let (r, g, b) = match tail.len() {
                    3 => (tail[0], tail[1], tail[2]),
                    // Leading colorspace id.
                    4.. => (tail[1], tail[2], tail[3]),
                    _ => return None,
                };
                Some((Color::rgb(r as u8, g as u8, b as u8), 0))
            }
            _ => None,
        }
    } else {
        // Semicolon form: the selector and payload are separate parameters.
        match params.get(i + 1)? {
            5 => {
                let n = params.get(i + 2)?;
                Some((Color::indexed(n as u8), 2))
            }
            2 => {
                let r = params.get(i + 2)?;
                let g = params.get(i + 3)?;
                let b = params.get(i + 4)?;
                Some((Color::rgb(r as u8, g as u8, b as u8), 4))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_reset() {
        assert_eq!(classify(&Params::default()), vec![AttrDelta::ResetAll]);
    }

    #[test]
    fn bold_and_semicolon_rgb() {
        let params = Params::from(&[1u16, 38, 2, 10, 20, 30][..]);
        assert_eq!(
            classify(&params),
            vec![
                AttrDelta::SetBold,
                AttrDelta::SetFg(Color::rgb(10, 20, 30))
            ]
        );
    }

    #[test]
    fn colon_rgb_form() {
        let params = Params::from(vec![vec![48, 2, 1, 2, 3]]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetBg(Color::rgb(1, 2, 3))]
        );
    }

    #[test]
    fn colon_rgb_with_colorspace_id() {
        let params = Params::from(vec![vec![38, 2, 0, 9, 8, 7]]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetFg(Color::rgb(9, 8, 7))]
        );
    }

    #[test]
    fn indexed_256() {
        let params = Params::from(&[38u16, 5, 208][..]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetFg(Color::indexed(208))]
        );
    }

    #[test]
    fn underline_styles() {
        let params = Params::from(vec![vec![4, 3]]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetUnderline(UnderlineStyle::Curly)]
        );
        let params = Params::from(&[4u16][..]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetUnderline(UnderlineStyle::Single)]
        );
        let params = Params::from(&[24u16][..]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetUnderline(UnderlineStyle::None)]
        );
    }

    #[test]
    fn underline_color() {
        let params = Params::from(&[58u16, 5, 12][..]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetUnderlineColor(Color::indexed(12))]
        );
    }

    #[test]
    fn bright_colors() {
        let params = Params::from(&[95u16, 104][..]);
        assert_eq!(
            classify(&params),
            vec![
                AttrDelta::SetFg(Color::indexed(13)),
                AttrDelta::SetBg(Color::indexed(12))
            ]
        );
    }

    #[test]
    fn unknown_codes_are_skipped() {
        let params = Params::from(&[1u16, 99, 31][..]);
        assert_eq!(
            classify(&params),
            vec![AttrDelta::SetBold, AttrDelta::SetFg(Color::indexed(1))]
        );
    }
}

//! Width-aware word wrap for `text` nodes carrying a `wrap` attribute.
//!
//! Break opportunities come from UAX#14 (`unicode-linebreak`). Greedy: break
//! at the last opportunity before the measured width would exceed the limit.
//! Mandatory breaks are kept. Text between breaks is left as written; only
//! whitespace hanging at a soft break is dropped. A segment wider than the
//! limit gets a line of its own and is never split.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::surface::{Font, GraphicsSurface};

/// Insert hard line breaks so each line of `text` fits in `max_width`
/// document units. `print_factor` converts the surface's device-unit
/// measurements back to document units.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    font: &Font,
    surface: &dyn GraphicsSurface,
    print_factor: f64,
) -> String {
    if text.is_empty() {
        return String::new();
    }
    let width_of = |s: &str| surface.measure_string(s, font).width / print_factor;

    let mut lines: Vec<&str> = Vec::new();
    let mut line_start = 0;
    let mut last_break: Option<usize> = None;

    for (end, opportunity) in linebreaks(text) {
        if end == line_start {
            continue;
        }
        if let Some(brk) = last_break {
            if width_of(text[line_start..end].trim_end()) > max_width {
                lines.push(text[line_start..brk].trim_end());
                line_start = brk;
            }
        }
        match opportunity {
            BreakOpportunity::Mandatory => {
                lines.push(text[line_start..end].trim_end_matches(is_line_break));
                line_start = end;
                last_break = None;
            }
            BreakOpportunity::Allowed => last_break = Some(end),
        }
    }

    if text.ends_with(is_line_break) {
        lines.push("");
    }
    lines.join("\n")
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

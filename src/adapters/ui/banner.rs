//! Neon ASCII banner with gradient (WA-INSIGHT).
//! Uses figlet's built-in standard font.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// WhatsApp Green (#25d366).
const WA_GREEN: (u8, u8, u8) = (0x25, 0xd3, 0x66);
/// Teal (#128c7e).
const WA_TEAL: (u8, u8, u8) = (0x12, 0x8c, 0x7e);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Gradient position of line `i` out of `total`.
fn gradient_t(i: usize, total: usize) -> f64 {
    if total <= 1 {
        1.0
    } else {
        i as f64 / (total - 1) as f64
    }
}

/// Prints the welcome banner: "WA-INSIGHT" in figlet ASCII with a gradient from
/// WhatsApp green to teal, then the version. Falls back to a plain title when the
/// font cannot render.
pub fn print_welcome() {
    let mut out = stdout();
    let art = FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("WA-INSIGHT").map(|figure| figure.to_string()))
        .unwrap_or_else(|| "WA-INSIGHT".to_string());
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let (r, g, b) = lerp_rgb(WA_GREEN, WA_TEAL, gradient_t(i, total));
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: WA_GREEN.0,
        g: WA_GREEN.1,
        b: WA_GREEN.2,
    }));
    let _ = out.execute(Print(format!("v{}  WhatsApp chat viewer & assistant\r\n", version)));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp_rgb(WA_GREEN, WA_TEAL, 0.0), WA_GREEN);
        assert_eq!(lerp_rgb(WA_GREEN, WA_TEAL, 1.0), WA_TEAL);
    }

    #[test]
    fn test_gradient_t() {
        assert_eq!(gradient_t(0, 1), 1.0);
        assert_eq!(gradient_t(0, 5), 0.0);
        assert_eq!(gradient_t(4, 5), 1.0);
    }
}

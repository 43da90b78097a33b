//! Startup banner: "POI-PROMO" in figlet's standard font with a gradient.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Harbour Blue (#1e6fd9).
const HARBOUR_BLUE: (u8, u8, u8) = (0x1e, 0x6f, 0xd9);
/// Signal Amber (#ffb000).
const SIGNAL_AMBER: (u8, u8, u8) = (0xff, 0xb0, 0x00);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Prints the welcome banner, then the version. Falls back to plain text if the
/// figlet font cannot render.
pub fn print_welcome() {
    let mut out = stdout();
    let art = FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("POI-PROMO").map(|figure| figure.to_string()))
        .unwrap_or_else(|| "POI-PROMO".to_string());
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(HARBOUR_BLUE, SIGNAL_AMBER, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(Print(format!(
        "v{} · promotional images for points of interest\r\n",
        version
    )));
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp_rgb(HARBOUR_BLUE, SIGNAL_AMBER, 0.0), HARBOUR_BLUE);
        assert_eq!(lerp_rgb(HARBOUR_BLUE, SIGNAL_AMBER, 1.0), SIGNAL_AMBER);
    }
}

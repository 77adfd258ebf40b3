use crossterm::style::Color;
use nhx_kit_core::controller::Status;
use nhx_kit_core::log_sink::Severity;

/// Parses `#RRGGBB`, or `#AARRGGBB` blended onto a black terminal background.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }

    let channel = |index: usize| u8::from_str_radix(digits.get(index..index + 2)?, 16).ok();

    let (alpha, rgb_start) = match digits.len() {
        6 => (u8::MAX, 0),
        8 => (channel(0)?, 2),
        _ => return None,
    };

    let blend = |value: u8| (u16::from(value) * u16::from(alpha) / u16::from(u8::MAX)) as u8;

    Some(Color::Rgb {
        r: blend(channel(rgb_start)?),
        g: blend(channel(rgb_start + 2)?),
        b: blend(channel(rgb_start + 4)?),
    })
}

/// Trait for accessing badge colors
pub trait StatusColor {
    fn foreground_color(&self) -> Color;
    fn background_color(&self) -> Color;
}

impl StatusColor for Status {
    fn foreground_color(&self) -> Color {
        parse_hex_color(self.foreground()).unwrap_or(Color::Reset)
    }

    fn background_color(&self) -> Color {
        parse_hex_color(self.background()).unwrap_or(Color::Reset)
    }
}

/// Text color of a log line.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Reset,
        Severity::Ok => Color::Green,
        Severity::Warn => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_opaque_color() {
        assert_eq!(
            parse_hex_color("#0078D4"),
            Some(Color::Rgb {
                r: 0x00,
                g: 0x78,
                b: 0xD4
            })
        );
    }

    #[test]
    fn test_parse_translucent_color_blends() {
        assert_eq!(
            parse_hex_color("#80FF0000"),
            Some(Color::Rgb { r: 128, g: 0, b: 0 })
        );
        assert_eq!(
            parse_hex_color("#00FFFFFF"),
            Some(Color::Rgb { r: 0, g: 0, b: 0 })
        );
    }

    #[test]
    fn test_parse_invalid_colors() {
        assert_eq!(parse_hex_color("0078D4"), None);
        assert_eq!(parse_hex_color("#0078D"), None);
        assert_eq!(parse_hex_color("#GG78D4"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_every_status_has_colors() {
        for status in [
            Status::Ready,
            Status::Running,
            Status::Succeeded,
            Status::Error,
        ] {
            assert_ne!(status.foreground_color(), Color::Reset);
            assert_ne!(status.background_color(), Color::Reset);
        }
    }
}

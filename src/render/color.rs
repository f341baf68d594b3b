use crate::error::{VidError, VidResult};

/// Parse a strict `#RRGGBB` hex color. No other format is accepted.
pub fn parse_hex(s: &str) -> VidResult<[u8; 3]> {
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| bad_color(s))?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad_color(s));
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap();
    Ok([channel(0..2), channel(2..4), channel(4..6)])
}

pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

fn bad_color(s: &str) -> VidError {
    VidError::validation(format!("invalid color {:?}, expected #RRGGBB", s))
}

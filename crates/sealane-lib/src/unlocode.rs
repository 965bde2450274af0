//! UN/LOCODE coordinate encoding.
//!
//! The UN/LOCODE registry stores geographic positions as `DDMMH DDDMMH`:
//! two digits of latitude degrees, two of minutes, and an `N`/`S` hemisphere
//! letter, followed by three digits of longitude degrees, two of minutes, and
//! an `E`/`W` hemisphere letter. `"5155N 00430E"` is Rotterdam,
//! `"3114N 12129E"` is Shanghai.

/// Decode a UN/LOCODE coordinate string into decimal `(lat, lon)` degrees.
///
/// Returns `None` for anything that does not match the grammar: wrong token
/// count, wrong token length, non-digit characters, an unknown hemisphere
/// letter, minutes of 60 or more, or a value outside ±90°/±180°. The parser
/// never panics and holds no state.
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let mut tokens = text.split_whitespace();
    let lat_token = tokens.next()?;
    let lon_token = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }

    let lat = parse_component(lat_token, 2, 'N', 'S')?;
    let lon = parse_component(lon_token, 3, 'E', 'W')?;

    if lat.abs() > 90.0 || lon.abs() > 180.0 {
        return None;
    }

    Some((lat, lon))
}

/// Re-encode decimal degrees as `DDMMH DDDMMH`.
///
/// Minutes are rounded to the nearest whole minute, so a decode/encode
/// round-trip is exact for registry-sourced strings and accurate to about
/// 0.01° for arbitrary coordinates.
pub fn encode_coordinates(lat: f64, lon: f64) -> String {
    let (lat_deg, lat_min) = split_degrees_minutes(lat.abs());
    let (lon_deg, lon_min) = split_degrees_minutes(lon.abs());
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!("{lat_deg:02}{lat_min:02}{ns} {lon_deg:03}{lon_min:02}{ew}")
}

fn split_degrees_minutes(value: f64) -> (u32, u32) {
    let mut degrees = value.trunc() as u32;
    let mut minutes = ((value - value.trunc()) * 60.0).round() as u32;
    if minutes == 60 {
        degrees += 1;
        minutes = 0;
    }
    (degrees, minutes)
}

fn parse_component(token: &str, degree_digits: usize, positive: char, negative: char) -> Option<f64> {
    if token.len() != degree_digits + 3 {
        return None;
    }
    if !token.is_ascii() {
        return None;
    }

    let degrees: u32 = token[..degree_digits].parse().ok()?;
    let minutes: u32 = token[degree_digits..degree_digits + 2].parse().ok()?;
    if minutes > 59 {
        return None;
    }

    let hemisphere = token
        .chars()
        .last()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| *c == positive || *c == negative)?;

    let decimal = f64::from(degrees) + f64::from(minutes) / 60.0;
    Some(if hemisphere == negative { -decimal } else { decimal })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(value: f64, expected: f64) {
        assert!((value - expected).abs() < 1e-4, "{value} != {expected}");
    }

    #[test]
    fn parses_rotterdam() {
        let (lat, lon) = parse_coordinates("5155N 00430E").unwrap();
        assert_close(lat, 51.9167);
        assert_close(lon, 4.5);
    }

    #[test]
    fn parses_southern_and_western_hemispheres() {
        let (lat, lon) = parse_coordinates("3351S 01825E").unwrap();
        assert_close(lat, -33.85);
        assert_close(lon, 18.4167);

        let (lat, lon) = parse_coordinates("4042N 07400W").unwrap();
        assert_close(lat, 40.7);
        assert_close(lon, -74.0);
    }

    #[test]
    fn accepts_lowercase_hemispheres_and_surrounding_whitespace() {
        let (lat, lon) = parse_coordinates("  5155n   00430e  ").unwrap();
        assert_close(lat, 51.9167);
        assert_close(lon, 4.5);
    }

    #[test]
    fn origin_parses_to_zero() {
        assert_eq!(parse_coordinates("0000N 00000E"), Some((0.0, 0.0)));
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert_eq!(parse_coordinates("9999N 99999E"), None); // minutes 99
        assert_eq!(parse_coordinates("9100N 00000E"), None); // |lat| > 90
        assert_eq!(parse_coordinates("0000N 18100E"), None); // |lon| > 180
        assert_eq!(parse_coordinates("0060N 00000E"), None); // minutes 60
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_coordinates(""), None);
        assert_eq!(parse_coordinates("   "), None);
        assert_eq!(parse_coordinates("5155N"), None);
        assert_eq!(parse_coordinates("5155N 00430E 1200N"), None);
        assert_eq!(parse_coordinates("51x5N 00430E"), None);
        assert_eq!(parse_coordinates("5155X 00430E"), None);
        assert_eq!(parse_coordinates("5155N 00430X"), None);
        assert_eq!(parse_coordinates("5155N 0430E"), None); // short lon token
        assert_eq!(parse_coordinates("515N 00430E"), None); // short lat token
        assert_eq!(parse_coordinates("5155E 00430N"), None); // swapped hemispheres
    }

    #[test]
    fn encode_round_trips_registry_strings() {
        for text in ["5155N 00430E", "3114N 12129E", "4042N 07400W", "0000N 00000E"] {
            let (lat, lon) = parse_coordinates(text).unwrap();
            assert_eq!(encode_coordinates(lat, lon), text);
        }
    }

    #[test]
    fn encode_carries_minute_overflow() {
        // 59.9999° rounds to 60 minutes, which must carry into the degrees.
        assert_eq!(encode_coordinates(59.9999, 0.0), "6000N 00000E");
    }
}

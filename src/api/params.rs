//! Query-parameter encoding and validation helpers

/// Percent-encodes a query parameter value.
///
/// Unreserved characters (alphanumerics plus `-`, `_`, `.`, `~`) pass
/// through, a space becomes `+`, and every other byte is emitted as `%XX`.
pub fn url_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());

    for byte in value.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }

    encoded
}

/// Whether `lat` is a valid latitude in degrees
pub fn validate_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

/// Whether `lon` is a valid longitude in degrees
pub fn validate_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon)
}

/// Whether `city` is an acceptable city name: non-empty and at most 100
/// characters
pub fn validate_city_name(city: &str) -> bool {
    !city.is_empty() && city.chars().count() <= 100
}

/// File stem used for a layer's output, safe on every common filesystem.
///
/// Characters outside `[A-Za-z0-9._-]` (the namespace separator included)
/// become `_`, so `transport:roads` maps to `transport_roads`.
pub fn output_stem(layer: &str) -> String {
    layer
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Layer name without its namespace prefix.
pub fn local_layer_name(layer: &str) -> &str {
    layer.rsplit(':').next().unwrap_or(layer)
}

/// Expands a short `AUTHORITY:CODE` reference into the OGC URN form used by
/// the GeoJSON `crs` member. Anything else is passed through untouched.
pub fn crs_urn(crs: &str) -> String {
    let trimmed = crs.trim();
    if trimmed.starts_with("urn:") {
        return trimmed.to_string();
    }

    match trimmed.split_once(':') {
        Some((authority, code)) if !authority.is_empty() && !code.is_empty() => {
            format!("urn:ogc:def:crs:{}::{}", authority.to_ascii_uppercase(), code)
        }
        _ => trimmed.to_string(),
    }
}

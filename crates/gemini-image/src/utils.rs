use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use std::path::Path;

pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

pub fn detect_mime_type<P: AsRef<Path>>(path: P) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_IMAGE_MIME)
        .to_string()
}

pub fn encode_byte_to_base64(bytes: &[u8]) -> String {
    BASE64_ENGINE.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_ENGINE.decode(data.trim())
}

pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

/// Builds a `data:` URL from a MIME type and an already encoded payload.
pub fn to_data_url(mime_type: &str, data_b64: &str) -> String {
    format!("data:{};base64,{}", mime_type, data_b64)
}

/// Splits a base64 `data:` URL into its MIME type and payload.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    if mime_type.is_empty() {
        return None;
    }
    Some((mime_type, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trips() {
        let url = to_data_url("image/png", "iVBORw0KGgo=");
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(parse_data_url(&url), Some(("image/png", "iVBORw0KGgo=")));
    }

    #[test]
    fn parse_data_url_rejects_non_base64_urls() {
        assert_eq!(parse_data_url("data:text/plain,hello"), None);
        assert_eq!(parse_data_url("https://example.com/a.png"), None);
        assert_eq!(parse_data_url("data:;base64,AAAA"), None);
    }

    #[test]
    fn detect_mime_type_falls_back_to_jpeg() {
        assert_eq!(detect_mime_type("reference.png"), "image/png");
        assert_eq!(detect_mime_type("reference"), FALLBACK_IMAGE_MIME);
    }
}

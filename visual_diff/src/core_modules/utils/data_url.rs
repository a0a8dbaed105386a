// Screenshots often travel as base64 text (read straight out of a file by a test
// runner). These helpers turn such text into a `data:` URL and back into bytes so the
// acquisition layer can treat inline images and file paths the same way.

pub mod data_url {
    use crate::error::{DiffError, Result};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    const DATA_SCHEME: &str = "data:";
    const BASE64_MARKER: &str = ";base64,";

    /// Wraps a base64-encoded PNG as a `data:image/png;base64,` URL.
    ///
    /// Whitespace (line wrapping) is stripped first. Anything that is not standard
    /// base64 is rejected with `InvalidInput`.
    pub fn img_base64_to_data_url(base64_string: &str) -> Result<String> {
        let compact: String = base64_string.chars().filter(|c| !c.is_whitespace()).collect();
        if !is_base64(&compact) {
            return Err(DiffError::invalid("argument should be a valid base64 string"));
        }
        Ok(format!("data:image/png;base64,{compact}"))
    }

    fn is_base64(text: &str) -> bool {
        let body = text.trim_end_matches('=');
        let padding = text.len() - body.len();
        !body.is_empty()
            && padding <= 2
            && body
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    }

    pub fn is_data_url(reference: &str) -> bool {
        reference.starts_with(DATA_SCHEME)
    }

    /// Decodes the payload of a base64 `data:` URL.
    pub fn decode_data_url(reference: &str) -> Result<Vec<u8>> {
        let Some(rest) = reference.strip_prefix(DATA_SCHEME) else {
            return Err(DiffError::invalid("reference is not a data URL"));
        };
        let Some(marker) = rest.find(BASE64_MARKER) else {
            return Err(DiffError::decode(reference, "only base64 data URLs are supported"));
        };
        let payload = &rest[marker + BASE64_MARKER.len()..];
        STANDARD
            .decode(payload.trim())
            .map_err(|err| DiffError::decode(reference, err))
    }
}

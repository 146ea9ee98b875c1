use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use audex_core::{AppError, AppResult};

/// Wire payload of the opaque pagination cursor.
#[derive(Debug, Deserialize)]
struct CursorPayload {
    id: i64,
}

/// Encodes an event id into an opaque cursor string: URL-safe base64 over
/// a JSON object `{"id": <n>}`.
#[must_use]
pub fn encode_cursor(id: i64) -> String {
    let payload = serde_json::json!({ "id": id }).to_string();
    URL_SAFE_NO_PAD.encode(payload.as_bytes())
}

/// Decodes an opaque cursor back into an event id. Any malformed input is
/// an [`AppError::InvalidCursor`]; callers surface it as a client input
/// failure, never as a silent default.
pub fn decode_cursor(raw: &str) -> AppResult<i64> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw.as_bytes())
        .map_err(|error| AppError::InvalidCursor(format!("cursor is not valid base64: {error}")))?;

    let payload: CursorPayload = serde_json::from_slice(&bytes)
        .map_err(|error| AppError::InvalidCursor(format!("cursor payload is malformed: {error}")))?;

    Ok(payload.id)
}

#[cfg(test)]
mod tests {
    use audex_core::AppError;

    use super::{decode_cursor, encode_cursor};

    #[test]
    fn cursor_round_trips_for_valid_ids() {
        for id in [0_i64, 1, 42, i64::MAX, -1] {
            let decoded = decode_cursor(encode_cursor(id).as_str());
            assert!(decoded.is_ok());
            assert_eq!(decoded.unwrap_or_default(), id);
        }
    }

    #[test]
    fn garbage_input_is_an_invalid_cursor_error() {
        let result = decode_cursor("not-base64!!");
        assert!(matches!(result, Err(AppError::InvalidCursor(_))));
    }

    #[test]
    fn valid_base64_with_malformed_payload_is_rejected() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let raw = URL_SAFE_NO_PAD.encode(b"{\"page\":3}");
        let result = decode_cursor(raw.as_str());
        assert!(matches!(result, Err(AppError::InvalidCursor(_))));
    }
}

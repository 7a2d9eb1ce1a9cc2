use crate::errors::FormError;
use crate::state::record::SubmissionRecord;

/// Decode a URL-encoded form body (`k1=v1&k2=v2`) into a submission record.
///
/// The whole body is percent-decoded first (`+` as space) and only then
/// split, so an encoded `%26` or `%3D` inside a value splits like a raw one.
/// Every `&`-separated segment must contain exactly one `=`; anything else,
/// including an empty body or an empty segment, is a `Parse` error.
/// Later duplicates of a field name overwrite earlier ones.
pub fn decode(body: &[u8]) -> Result<SubmissionRecord, FormError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| FormError::Parse(format!("body is not valid UTF-8: {e}")))?;

    let spaced = text.replace('+', " ");
    let raw = urlencoding::decode_binary(spaced.as_bytes());
    let decoded = String::from_utf8_lossy(&raw);

    let mut record = SubmissionRecord::new();
    for segment in decoded.split('&') {
        let mut parts = segment.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => {
                record.insert(name.to_string(), value.to_string());
            }
            _ => {
                return Err(FormError::Parse(format!(
                    "segment {segment:?} must contain exactly one '='"
                )))
            }
        }
    }

    Ok(record)
}

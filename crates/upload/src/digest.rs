//! MD5 digests as reported in storage ETags.

/// MD5 of `data` as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Strips surrounding whitespace and double quotes from an ETag.
pub fn normalize_digest(etag: &str) -> &str {
    etag.trim().trim_matches('"').trim()
}

/// Compares two digests after normalizing both.
pub fn digests_match(a: &str, b: &str) -> bool {
    normalize_digest(a) == normalize_digest(b)
}

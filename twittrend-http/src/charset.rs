//! Character encoding resolution for fetched HTML.
//!
//! Order: the `Content-Type` charset parameter, then a `<meta>` declaration in
//! the first 1024 bytes, then UTF-8. A byte-order mark overrides all of them
//! (`encoding_rs` checks it while decoding).

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use std::sync::OnceLock;

const SNIFF_WINDOW: usize = 1024;

/// Pull the `charset` parameter out of a `Content-Type` header value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|v| !v.is_empty())
    })
}

fn meta_charset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
            .expect("meta charset pattern is valid")
    })
}

/// Look for `<meta charset=..>` or an `http-equiv` content type near the top of the body.
pub fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(SNIFF_WINDOW)];
    let caps = meta_charset_re().captures(head)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

pub fn resolve_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| sniff_meta_charset(body))
        .unwrap_or(UTF_8)
}

/// Decode `body` and report the encoding actually used and whether any
/// malformed sequences were replaced.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> (String, &'static Encoding, bool) {
    let encoding = resolve_encoding(content_type, body);
    let (text, used, had_errors) = encoding.decode(body);
    (text.into_owned(), used, had_errors)
}

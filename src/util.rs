//! Small utility helpers used across modules.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Bearer token from the `Authorization` header, if any.
/// An empty token counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
  let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
  let token = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?.trim();
  if token.is_empty() { None } else { Some(token.to_string()) }
}

/// Log-safe truncation for large strings.
/// Cuts on a char boundary so multi-byte text does not panic.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  #[test]
  fn bearer_token_extraction() {
    let mut h = HeaderMap::new();
    assert_eq!(bearer_token(&h), None);
    h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
    assert_eq!(bearer_token(&h).as_deref(), Some("abc.def"));
    h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
    assert_eq!(bearer_token(&h), None);
    h.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
    assert_eq!(bearer_token(&h), None);
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let s = "অআইঈ";
    let out = trunc_for_log(s, 4);
    assert!(out.starts_with("অ"));
    assert!(out.ends_with("(12 bytes total)"));
  }
}

use axum::http::{header, HeaderMap, HeaderValue, Uri};
use cookie::{time::Duration, Cookie, SameSite};
use tracing::warn;

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
pub const OAUTH_STATE_TTL_SECS: i64 = 600;

/// Whether the request reached us over HTTPS, directly or through a proxy.
pub fn is_https(headers: &HeaderMap, uri: &Uri) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

fn base_cookie(name: &str, value: &str, secure: bool, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

pub fn session_cookie(name: &str, session_id: &str, secure: bool, ttl_secs: i64) -> Cookie<'static> {
    base_cookie(name, session_id, secure, ttl_secs)
}

pub fn state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    base_cookie(OAUTH_STATE_COOKIE, state, secure, OAUTH_STATE_TTL_SECS)
}

/// Empty value with `Max-Age=0`, which makes the browser drop the cookie.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    base_cookie(name, "", false, 0)
}

pub fn to_header_value(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Cookie {} is not a valid header value: {}", cookie.name(), e);
            None
        }
    }
}

/// `Set-Cookie` headers for a response, one per cookie.
pub fn set_cookie_headers(cookies: &[Cookie<'_>]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for value in cookies.iter().filter_map(to_header_value) {
        headers.append(header::SET_COOKIE, value);
    }
    headers
}

/// First non-empty value of cookie `name` across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let rendered = session_cookie("session_id", "abc", true, 7200).to_string();
        assert!(rendered.starts_with("session_id=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Max-Age=7200"));
    }

    #[test]
    fn test_removal_cookie_expires_now() {
        let rendered = removal_cookie("session_id").to_string();
        assert!(rendered.starts_with("session_id=;"));
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session_id=s-1"));
        assert_eq!(read_cookie(&headers, "session_id").as_deref(), Some("s-1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_set_cookie_headers_keeps_every_cookie() {
        let headers = set_cookie_headers(&[
            session_cookie("session_id", "abc", false, 60),
            removal_cookie(OAUTH_STATE_COOKIE),
        ]);
        assert_eq!(headers.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_is_https_behind_proxy() {
        let uri: Uri = "/api/v1/auth/google/callback".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert!(!is_https(&headers, &uri));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert!(is_https(&headers, &uri));

        let absolute: Uri = "https://shop.example.com/".parse().unwrap();
        assert!(is_https(&HeaderMap::new(), &absolute));
    }
}

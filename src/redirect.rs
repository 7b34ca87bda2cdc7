use url::Url;

/// is_safe_redirect
///
/// Decides whether a caller-supplied post-login destination may be redirected to.
/// `target` is resolved against the current request's origin, exactly as a
/// browser would resolve a relative link, and is considered safe only when the
/// resolved URL stays on the request's own host over http or https.
///
/// This closes the open-redirect hole where a crafted `next` parameter bounces a
/// freshly authenticated user to an attacker-controlled site: absolute URLs to
/// other hosts, protocol-relative `//evil.example/...` forms, and non-web
/// schemes all resolve off-origin and are rejected.
///
/// `request_host` is the value of the Host header, including any port.
pub fn is_safe_redirect(target: &str, request_host: &str) -> bool {
    let Ok(base) = Url::parse(&format!("http://{request_host}/")) else {
        return false;
    };
    let Ok(resolved) = base.join(target) else {
        return false;
    };

    matches!(resolved.scheme(), "http" | "https")
        && resolved.host_str() == base.host_str()
        && resolved.port() == base.port()
}

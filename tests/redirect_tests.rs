use inkpost::redirect::is_safe_redirect;

const HOST: &str = "myapp.example";

#[test]
fn test_relative_paths_are_safe() {
    assert!(is_safe_redirect("/post/3", HOST));
    assert!(is_safe_redirect("/", HOST));
    assert!(is_safe_redirect("relative/path", HOST));
    assert!(is_safe_redirect("/login?error=x", HOST));
}

#[test]
fn test_absolute_url_to_own_host_is_safe() {
    assert!(is_safe_redirect("http://myapp.example/post/3", HOST));
    // Scheme upgrades stay on-origin.
    assert!(is_safe_redirect("https://myapp.example/post/3", HOST));
}

#[test]
fn test_cross_host_urls_are_rejected() {
    assert!(!is_safe_redirect("https://evil.example/x", HOST));
    assert!(!is_safe_redirect("http://evil.example", HOST));
    // A lookalike subdomain is still a different host.
    assert!(!is_safe_redirect("https://myapp.example.evil.example/x", HOST));
}

#[test]
fn test_protocol_relative_urls_are_rejected() {
    // "//evil.example/x" resolves to the attacker's host under the request scheme.
    assert!(!is_safe_redirect("//evil.example/x", HOST));
}

#[test]
fn test_non_web_schemes_are_rejected() {
    assert!(!is_safe_redirect("javascript:alert(1)", HOST));
    assert!(!is_safe_redirect("data:text/html,<script>x</script>", HOST));
    assert!(!is_safe_redirect("ftp://myapp.example/file", HOST));
}

#[test]
fn test_port_is_part_of_the_origin() {
    assert!(is_safe_redirect("/post/3", "myapp.example:8080"));
    assert!(is_safe_redirect(
        "http://myapp.example:8080/x",
        "myapp.example:8080"
    ));
    // Same host on a different port is a different origin.
    assert!(!is_safe_redirect("http://myapp.example:8080/x", HOST));
    assert!(!is_safe_redirect("http://myapp.example/x", "myapp.example:8080"));
}

//! Shared fixtures for the integration tests
//!
//! A wiremock server stands in for the firewall's web interface. Session
//! cookies are used to tell logins apart: every successful login hands out
//! the next `PHPSESSID` from the list given to [`mount_login`].

#![allow(dead_code)]

use pfsense_watch::config::{parse_config, Config};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html><head><script>var csrfMagicToken = "sid:loginpage01,1697450000;ip:abc,1697450000";</script></head>
<body><form class="login" method="post">
<input type="text" name="usernamefld" id="usernamefld">
<input type="password" name="passwordfld" id="passwordfld">
<button type="submit" name="login" value="Sign In">Sign In</button>
</form></body></html>"#;

pub const LOGIN_FAILED_PAGE: &str = r#"<!DOCTYPE html>
<html><body><div class="alert alert-danger">Username or Password incorrect</div>
<form><input name="usernamefld"><input name="passwordfld"></form></body></html>"#;

pub const ACCESS_DENIED: &str = "\ndocument.location.href = 'https://192.168.1.1/index.php';\n";

pub const STATS_LINE: &str = "3520138|3346|15|3 Days 04 Hours 12 Minutes 08 Seconds|120/400000|45.0|Mon Oct 16 10:12:08 UTC 2023|Current: 1200 MHz, Max: 2400 MHz|0.15, 0.20, 0.18|1016/246542|0|1";

pub const VERSION_JSON: &str =
    r#"{"version":"2.7.2","installed_version":"2.7.2","pkg_version_compare":"="}"#;

pub const THERMAL: &str = "dev.cpu.0.temperature:45.0C|dev.cpu.1.temperature:46.0C";

pub const DISKS_WIDGET: &str = r#"<table class="table">
<thead><tr><th>Path</th><th>Size</th><th>Used</th><th>Usage</th></tr></thead>
<tbody><tr><td>/</td><td>18GiB</td><td>2.1GiB</td><td><span>12% of 18GiB (zfs)</span></td></tr></tbody>
</table>"#;

pub const GATEWAYS_PAGE: &str = r#"<html><body><div class="panel panel-default">
<div class="panel-heading"><h2 class="panel-title">Gateways</h2></div>
<table class="table">
<thead><tr><th>Name</th><th>Gateway</th><th>Monitor</th><th>RTT</th><th>RTTsd</th><th>Loss</th><th>Status</th><th>Description</th></tr></thead>
<tbody><tr><td>WAN_DHCP</td><td>203.0.113.1</td><td>203.0.113.1</td><td>0.512ms</td><td>0.101ms</td><td>0.0%</td><td>Online</td><td>Uplink</td></tr></tbody>
</table></div></body></html>"#;

pub const DHCP_PAGE: &str = r#"<html><body>
<div class="panel panel-default">
<div class="panel-heading"><h2 class="panel-title">Leases</h2></div>
<table class="table">
<thead><tr><th>IP address</th><th>MAC address</th><th>Hostname</th><th>Description</th><th>Start</th><th>End</th><th>Online</th><th>Lease Type</th></tr></thead>
<tbody><tr><td>192.168.1.100</td><td>00:0c:29:aa:bb:cc</td><td>laptop</td><td></td><td>2023/10/16 09:00:00</td><td>2023/10/16 11:00:00</td><td>online</td><td>active</td></tr></tbody>
</table></div>
<div class="panel panel-default">
<div class="panel-heading"><h2 class="panel-title">Leases in Use</h2></div>
<table class="table">
<thead><tr><th>Interface</th><th>Pool Start</th><th>Pool End</th><th>Used</th><th>Capacity</th><th>Utilization</th></tr></thead>
<tbody><tr><td>LAN</td><td>192.168.1.100</td><td>192.168.1.199</td><td>1</td><td>100</td><td>1%</td></tr></tbody>
</table></div>
</body></html>"#;

/// Dashboard shown after login, carrying a fresh anti-forgery token
pub fn dashboard(token: &str) -> String {
    format!(
        r#"<html><head><script>var csrfMagicToken = "{}";</script></head>
<body><a href="/index.php?logout">Logout</a></body></html>"#,
        token
    )
}

/// Builds a validated config pointing at the mock server
pub fn test_config(server: &MockServer, extra_client: &str) -> Config {
    let url = url::Url::parse(&server.uri()).expect("mock server uri");
    parse_config(&format!(
        r#"
[firewall]
host = "{}"
port = {}
scheme = "http"
username = "admin"
password = "pfsense"

[client]
timeout-secs = 5
retry-attempts = 3
retry-backoff-ms = 10
max-concurrent-requests = 8
{}
"#,
        url.host_str().expect("mock server host"),
        url.port().expect("mock server port"),
        extra_client
    ))
    .expect("test config is valid")
}

/// Serves the login form on `GET /index.php`
pub async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;
}

/// Accepts one login per session id, in order; later logins are rejected
pub async fn mount_login(server: &MockServer, session_ids: &[&str]) {
    for id in session_ids {
        Mock::given(method("POST"))
            .and(path("/index.php"))
            .and(body_string_contains("usernamefld=admin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", format!("PHPSESSID={}; path=/", id).as_str())
                    .set_body_string(dashboard(&format!("sid:{}", id))),
            )
            .up_to_n_times(1)
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FAILED_PAGE))
        .mount(server)
        .await;
}

pub fn is_login_post(request: &Request) -> bool {
    AsRef::<str>::as_ref(&request.method) == "POST" && request.url.path() == "/index.php"
}

pub async fn count_requests(server: &MockServer, filter: impl Fn(&Request) -> bool) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| filter(r))
        .count()
}

pub async fn login_posts(server: &MockServer) -> usize {
    count_requests(server, is_login_post).await
}

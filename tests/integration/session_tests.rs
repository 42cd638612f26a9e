//! Session lifecycle tests against a mock web interface

mod common;

use common::*;
use pfsense_watch::session::{RequestSpec, SessionManager, SessionState};
use pfsense_watch::{AuthError, RequestError};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_then_request_carries_token() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1"]).await;

    // Only answers posts carrying the token from the dashboard
    Mock::given(method("POST"))
        .and(path("/getstats.php"))
        .and(body_string_contains("__csrf_magic=sid%3Agen1"))
        .and(body_string_contains("ajax=ajax"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATS_LINE))
        .mount(&mock_server)
        .await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    assert_eq!(session.state().await, SessionState::Unauthenticated);
    assert!(session.last_activity().await.is_none());

    let response = session
        .execute(&RequestSpec::post("getstats.php"))
        .await
        .unwrap();

    assert_eq!(response.body, STATS_LINE);
    assert_eq!(session.state().await, SessionState::Authenticated);
    assert_eq!(session.generation().await, 1);
    assert!(session.last_activity().await.is_some());
    assert_eq!(login_posts(&mock_server).await, 1);
}

#[tokio::test]
async fn test_invalid_credentials() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &[]).await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();

    let result = session.execute(&RequestSpec::get("status_gateways.php")).await;
    assert!(matches!(
        result,
        Err(RequestError::Auth(AuthError::InvalidCredentials))
    ));
    assert_eq!(session.state().await, SessionState::Unauthenticated);

    // The data page was never requested
    let data_requests = count_requests(&mock_server, |r| {
        r.url.path() == "/status_gateways.php"
    })
    .await;
    assert_eq!(data_requests, 0);
}

#[tokio::test]
async fn test_login_page_without_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    let result = session.login().await;

    assert!(matches!(result, Err(AuthError::UnexpectedResponse(_))));
    assert_eq!(login_posts(&mock_server).await, 0);
}

#[tokio::test]
async fn test_expired_session_relogs_once() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1", "gen2"]).await;

    // First answer bounces to the login form, later ones succeed
    Mock::given(method("GET"))
        .and(path("/status_gateways.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status_gateways.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GATEWAYS_PAGE))
        .mount(&mock_server)
        .await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    let response = session
        .execute(&RequestSpec::get("status_gateways.php"))
        .await
        .unwrap();

    assert_eq!(response.body, GATEWAYS_PAGE);
    assert_eq!(session.generation().await, 2);
    assert_eq!(login_posts(&mock_server).await, 2);
}

#[tokio::test]
async fn test_relogin_rejected_is_bounded() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    // Password changed after the first login
    mount_login(&mock_server, &["gen1"]).await;

    Mock::given(method("POST"))
        .and(path("/widgets/widgets/thermal_sensors.widget.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCESS_DENIED))
        .mount(&mock_server)
        .await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    let result = session
        .execute(&RequestSpec::post("widgets/widgets/thermal_sensors.widget.php"))
        .await;

    assert!(matches!(
        result,
        Err(RequestError::SessionExpired(AuthError::InvalidCredentials))
    ));
    assert_eq!(session.state().await, SessionState::Unauthenticated);
    assert_eq!(login_posts(&mock_server).await, 2);
}

#[tokio::test]
async fn test_still_expired_after_relogin() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1", "gen2", "gen3"]).await;

    Mock::given(method("POST"))
        .and(path("/getstats.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCESS_DENIED))
        .mount(&mock_server)
        .await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    let result = session.execute(&RequestSpec::post("getstats.php")).await;

    assert!(matches!(
        result,
        Err(RequestError::SessionExpired(AuthError::UnexpectedResponse(_)))
    ));
    assert_eq!(session.state().await, SessionState::Expired);

    // One initial login, one re-login, two data requests; nothing more
    assert_eq!(login_posts(&mock_server).await, 2);
    let data_requests = count_requests(&mock_server, |r| r.url.path() == "/getstats.php").await;
    assert_eq!(data_requests, 2);
}

#[tokio::test]
async fn test_concurrent_expiry_single_relogin() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1", "gen2"]).await;

    // Only the second session is accepted by the data page
    Mock::given(method("GET"))
        .and(path("/diag_arp.php"))
        .and(header("cookie", "PHPSESSID=gen2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/diag_arp.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&mock_server)
        .await;

    let session = Arc::new(SessionManager::new(&test_config(&mock_server, "")).unwrap());
    session.login().await.unwrap();
    assert_eq!(session.generation().await, 1);

    let mut handles = Vec::new();
    for _ in 0..6 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            session.execute(&RequestSpec::get("diag_arp.php")).await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.body, "<table></table>");
    }

    assert_eq!(session.generation().await, 2);
    assert_eq!(login_posts(&mock_server).await, 2);
}

#[tokio::test]
async fn test_concurrent_first_use_single_login() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1"]).await;

    Mock::given(method("GET"))
        .and(path("/status_carp.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let session = Arc::new(SessionManager::new(&test_config(&mock_server, "")).unwrap());

    let mut handles = Vec::new();
    for _ in 0..5 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            session.execute(&RequestSpec::get("status_carp.php")).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(login_posts(&mock_server).await, 1);
}

#[tokio::test]
async fn test_server_error_is_reported_not_expired() {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1"]).await;

    Mock::given(method("GET"))
        .and(path("/status_openvpn.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    let result = session.execute(&RequestSpec::get("status_openvpn.php")).await;

    match result {
        Err(e @ RequestError::HttpStatus { status: 503, .. }) => assert!(e.is_transient()),
        other => panic!("expected HTTP 503, got {:?}", other),
    }
    assert_eq!(session.state().await, SessionState::Authenticated);
    assert_eq!(login_posts(&mock_server).await, 1);
}

#[tokio::test]
async fn test_logout() {
    let mock_server = MockServer::start().await;

    // Mounted first so it wins over the plain login page
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("logout", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1"]).await;

    let session = SessionManager::new(&test_config(&mock_server, "")).unwrap();
    session.login().await.unwrap();
    assert_eq!(session.state().await, SessionState::Authenticated);

    session.logout().await.unwrap();
    assert_eq!(session.state().await, SessionState::Unauthenticated);

    // A second logout has nothing to end on the appliance
    session.logout().await.unwrap();
    mock_server.verify().await;
}

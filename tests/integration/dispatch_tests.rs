//! Endpoint dispatch tests: registry lookup, retry and partial results

mod common;

use common::*;
use pfsense_watch::api::supported_endpoints;
use pfsense_watch::parsers::{GatewayStatus, Record};
use pfsense_watch::{PfError, PfSenseClient, RequestError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_health_pages(server: &MockServer, thermal_body: &str) {
    Mock::given(method("POST"))
        .and(path("/getstats.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATS_LINE))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pkg_mgr_install.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VERSION_JSON))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/widgets/widgets/thermal_sensors.widget.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(thermal_body))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/widgets/widgets/disks.widget.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DISKS_WIDGET))
        .mount(server)
        .await;
}

async fn logged_in_server() -> MockServer {
    let mock_server = MockServer::start().await;
    mount_login_page(&mock_server).await;
    mount_login(&mock_server, &["gen1"]).await;
    mock_server
}

#[tokio::test]
async fn test_call_api_gateways() {
    let mock_server = logged_in_server().await;

    Mock::given(method("GET"))
        .and(path("/status_gateways.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GATEWAYS_PAGE))
        .mount(&mock_server)
        .await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let record = client.call_api("gateways").await.unwrap();

    match &record {
        Record::Gateways(gateways) => {
            assert_eq!(gateways.len(), 1);
            assert_eq!(gateways[0].name, "WAN_DHCP");
            assert_eq!(gateways[0].status, GatewayStatus::Online);
        }
        other => panic!("unexpected record {:?}", other),
    }
    assert_eq!(record.endpoint_id(), "gateways");

    // Same page, same record
    let again = client.call_api("gateways").await.unwrap();
    assert_eq!(record, again);
    assert_eq!(login_posts(&mock_server).await, 1);
}

#[tokio::test]
async fn test_repeated_calls_return_identical_records() {
    let mock_server = logged_in_server().await;

    Mock::given(method("POST"))
        .and(path("/getstats.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATS_LINE))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status_dhcp_leases.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DHCP_PAGE))
        .mount(&mock_server)
        .await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();

    for endpoint_id in ["general", "dhcp_leases"] {
        let first = client.call_api(endpoint_id).await.unwrap();
        let second = client.call_api(endpoint_id).await.unwrap();
        assert_eq!(first, second, "{} changed between calls", endpoint_id);
        assert_eq!(first.endpoint_id(), endpoint_id);
    }

    match client.call_api("dhcp_leases").await.unwrap() {
        Record::DhcpLeases(status) => {
            assert!(status.pool_status.is_empty());
            assert_eq!(status.leases.len(), 1);
            assert_eq!(status.leases[0].hostname, "laptop");
            assert_eq!(status.utilization[0].capacity, 100);
        }
        other => panic!("unexpected record {:?}", other),
    }
    assert_eq!(login_posts(&mock_server).await, 1);
}

#[tokio::test]
async fn test_unknown_endpoint_makes_no_request() {
    let mock_server = MockServer::start().await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let result = client.call_api("firewall_rules").await;

    assert!(matches!(result, Err(PfError::UnknownEndpoint(id)) if id == "firewall_rules"));
    assert_eq!(count_requests(&mock_server, |_| true).await, 0);
}

#[tokio::test]
async fn test_system_stats_partial_failure() {
    let mock_server = logged_in_server().await;
    mount_health_pages(&mock_server, "<b>Warning</b>: sensors unavailable").await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let stats = client.system_stats().await;

    let keys: Vec<&str> = stats.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["disks", "general", "software_system", "thermal"]);

    assert!(matches!(stats["general"], Ok(Record::General(_))));
    assert!(matches!(stats["software_system"], Ok(Record::SoftwareSystem(_))));
    assert!(matches!(stats["disks"], Ok(Record::Disks(_))));
    assert!(matches!(
        &stats["thermal"],
        Err(PfError::Parse { endpoint_id, .. }) if endpoint_id == "thermal"
    ));

    // Concurrent fetches share one login
    assert_eq!(login_posts(&mock_server).await, 1);
}

#[tokio::test]
async fn test_system_stats_values() {
    let mock_server = logged_in_server().await;
    mount_health_pages(&mock_server, THERMAL).await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let stats = client.system_stats().await;

    match &stats["thermal"] {
        Ok(Record::Thermal(sensors)) => {
            assert_eq!(sensors.len(), 2);
            assert_eq!(sensors[0].sensor, "dev.cpu.0.temperature");
            assert_eq!(sensors[0].temp_c, 45.0);
        }
        other => panic!("unexpected thermal outcome {:?}", other),
    }
    match &stats["software_system"] {
        Ok(Record::SoftwareSystem(version)) => {
            assert_eq!(version.installed_version, "2.7.2");
            assert_eq!(version.pkg_version_compare, "=");
        }
        other => panic!("unexpected version outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_transient_failure_retried() {
    let mock_server = logged_in_server().await;

    Mock::given(method("GET"))
        .and(path("/status_gateways.php"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status_gateways.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GATEWAYS_PAGE))
        .mount(&mock_server)
        .await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    assert!(client.call_api("gateways").await.is_ok());

    let attempts = count_requests(&mock_server, |r| r.url.path() == "/status_gateways.php").await;
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let mock_server = logged_in_server().await;

    Mock::given(method("GET"))
        .and(path("/status_carp.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = PfSenseClient::new(&test_config(&mock_server, "retry-attempts = 2")).unwrap();
    let result = client.call_api("carp").await;

    assert!(matches!(
        result,
        Err(PfError::Request(RequestError::HttpStatus { status: 500, .. }))
    ));
    let attempts = count_requests(&mock_server, |r| r.url.path() == "/status_carp.php").await;
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mock_server = logged_in_server().await;

    Mock::given(method("GET"))
        .and(path("/haproxy/haproxy_stats.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let result = client.call_api("haproxy").await;

    assert!(matches!(
        result,
        Err(PfError::Request(RequestError::HttpStatus { status: 404, .. }))
    ));
    let attempts =
        count_requests(&mock_server, |r| r.url.path() == "/haproxy/haproxy_stats.php").await;
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_parse_failure_not_retried() {
    let mock_server = logged_in_server().await;
    mount_health_pages(&mock_server, "not a sensor list").await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let result = client.call_api("thermal").await;

    assert!(matches!(result, Err(PfError::Parse { .. })));
    let attempts = count_requests(&mock_server, |r| {
        r.url.path() == "/widgets/widgets/thermal_sensors.widget.php"
    })
    .await;
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_all_system_stats_covers_registry() {
    let mock_server = logged_in_server().await;
    mount_health_pages(&mock_server, THERMAL).await;

    // Everything else is missing on this appliance
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = PfSenseClient::new(&test_config(&mock_server, "")).unwrap();
    let stats = client.all_system_stats().await;

    assert_eq!(stats.len(), supported_endpoints().len());
    for id in supported_endpoints() {
        assert!(stats.contains_key(id), "{} missing", id);
    }
    assert!(stats["general"].is_ok());
    assert!(matches!(
        stats["arp"],
        Err(PfError::Request(RequestError::HttpStatus { status: 404, .. }))
    ));
}

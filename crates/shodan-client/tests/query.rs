//! End-to-end pagination against a mock search server.

use shodan_client::{Query, ShodanClient, ShodanError};
use shodan_core::HasPages;
use std::rc::Rc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(hosts: &[(&str, &str)]) -> String {
    let results: String = hosts
        .iter()
        .map(|(ip, banner)| {
            format!(
                r#"<div class="result"><div><a href="/host/{ip}">{ip}</a> <span>Added on 16.11.2009</span></div><p>{banner}</p></div>"#
            )
        })
        .collect();

    format!(r#"<html><body><div id="search">{results}</div></body></html>"#)
}

async fn mount_page(server: &MockServer, page: Option<&str>, body: String) {
    mount_results(server, "ssh port:22", page, body).await;
}

async fn mount_results(server: &MockServer, expression: &str, page: Option<&str>, body: String) {
    let mock = Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", expression));
    let response = ResponseTemplate::new(200).set_body_string(body);

    // Requests for later pages also match the unpaged mock.
    let mock = match page {
        Some(page) => mock
            .and(query_param("page", page))
            .respond_with(response)
            .with_priority(1),
        None => mock.respond_with(response),
    };

    mock.mount(server).await;
}

fn query_for(base_url: String) -> Query {
    let client = ShodanClient::builder()
        .base_url(base_url)
        .build()
        .expect("client builds");

    client.query().query("ssh").port(22)
}

#[tokio::test(flavor = "multi_thread")]
async fn walks_pages_until_empty() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        results_page(&[("10.0.0.1", "SSH-2.0-OpenSSH_4.2"), ("10.0.0.2", "SSH-2.0-dropbear")]),
    )
    .await;
    mount_page(&server, Some("2"), results_page(&[("10.0.0.3", "SSH-1.99-Cisco-1.25")])).await;
    mount_page(&server, Some("3"), results_page(&[])).await;

    let base_url = server.uri();
    let (ips, second_walk) = tokio::task::spawn_blocking(move || {
        let query = query_for(base_url);

        let mut ips = Vec::new();
        query
            .for_each_host(|host| ips.push(host.ip().to_string()))
            .expect("walk succeeds");

        let second_walk = query.iter_hosts().count();
        (ips, second_walk)
    })
    .await
    .expect("blocking task completes");

    assert_eq!(ips, ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    assert_eq!(second_walk, 3);

    // Pages 1-3 were each requested once; the second walk came from the cache.
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn addresses_hosts_by_rank() {
    let server = MockServer::start().await;

    let first: Vec<(String, String)> = (1..=20)
        .map(|n| (format!("10.0.1.{n}"), "SSH-2.0-OpenSSH_5.1".to_string()))
        .collect();
    let first: Vec<(&str, &str)> = first.iter().map(|(ip, b)| (ip.as_str(), b.as_str())).collect();

    mount_page(&server, None, results_page(&first)).await;
    mount_page(&server, Some("2"), results_page(&[("10.0.2.1", "SSH-2.0-OpenSSH_5.1")])).await;

    let base_url = server.uri();
    tokio::task::spawn_blocking(move || {
        let query = query_for(base_url);

        assert_eq!(query.first_host().unwrap().ip(), "10.0.1.1");
        assert_eq!(query.host_at(20).unwrap().ip(), "10.0.1.20");
        assert_eq!(query.host_at(21).unwrap().ip(), "10.0.2.1");
        assert!(matches!(
            query.host_at(22),
            Err(ShodanError::IndexOutOfRange { page: 2, offset: 1, len: 1, .. })
        ));

        let again = query.page_at(2).unwrap();
        assert!(Rc::ptr_eq(&again, &query.page_at(2).unwrap()));
    })
    .await
    .expect("blocking task completes");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_not_end_of_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let base_url = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        let query = query_for(base_url);
        let err = query.for_each_page(|_| panic!("no page should be visited")).unwrap_err();
        assert!(!query.page_cache().contains(1));
        err
    })
    .await
    .expect("blocking task completes");

    assert!(err.is_fetch_failure());
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test(flavor = "multi_thread")]
async fn refined_query_fetches_fresh_results() {
    let server = MockServer::start().await;

    mount_results(&server, "ssh", None, results_page(&[("10.0.0.1", "SSH-2.0-OpenSSH_4.2")])).await;
    mount_page(&server, None, results_page(&[("10.9.9.9", "SSH-2.0-dropbear")])).await;

    let base_url = server.uri();
    let (before, after) = tokio::task::spawn_blocking(move || {
        let client = ShodanClient::builder()
            .base_url(base_url)
            .build()
            .expect("client builds");

        let query = client.query().query("ssh");
        let before = query.first_host().expect("first search").ip().to_string();

        let query = query.port(22);
        let after = query.first_host().expect("refined search").ip().to_string();
        (before, after)
    })
    .await
    .expect("blocking task completes");

    assert_eq!(before, "10.0.0.1");
    assert_eq!(after, "10.9.9.9");
}

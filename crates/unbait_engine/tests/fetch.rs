use std::time::Duration;

use pretty_assertions::assert_eq;
use unbait_engine::{FailureKind, FetchSettings, FetchedPage, Fetcher, ReqwestFetcher};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .and(header_exists("user-agent"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

async fn load(server: &MockServer, route: &str, settings: FetchSettings) -> Result<FetchedPage, FailureKind> {
    let fetcher = ReqwestFetcher::new(settings).expect("client builds");
    fetcher
        .fetch(&format!("{}{route}", server.uri()))
        .await
        .map_err(|err| err.kind)
}

#[tokio::test]
async fn document_loads_with_status_and_type() {
    let server = serve(
        "/story",
        ResponseTemplate::new(200).set_body_raw("<p>hello</p>", "text/html; charset=utf-8"),
    )
    .await;

    let page = load(&server, "/story", FetchSettings::default()).await.unwrap();
    assert_eq!(
        page,
        FetchedPage {
            requested_url: format!("{}/story", server.uri()),
            final_url: format!("{}/story", server.uri()),
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: b"<p>hello</p>".to_vec(),
        }
    );
}

#[tokio::test]
async fn error_status_still_yields_the_error_page() {
    let server = serve(
        "/gone",
        ResponseTemplate::new(404).set_body_raw("<h1>Not Found</h1>", "text/html"),
    )
    .await;

    let page = load(&server, "/gone", FetchSettings::default()).await.unwrap();
    assert_eq!(page.status, 404);
    assert_eq!(page.body, b"<h1>Not Found</h1>");
}

#[tokio::test]
async fn redirects_report_the_final_url() {
    let server = serve(
        "/short",
        ResponseTemplate::new(301).insert_header("Location", "/long"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/long"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>there</p>", "text/html"))
        .mount(&server)
        .await;

    let page = load(&server, "/short", FetchSettings::default()).await.unwrap();
    assert_eq!(page.final_url, format!("{}/long", server.uri()));
    assert_eq!(page.requested_url, format!("{}/short", server.uri()));
}

#[tokio::test]
async fn redirect_loops_stop_at_the_limit() {
    let server = serve(
        "/loop",
        ResponseTemplate::new(302).insert_header("Location", "/loop"),
    )
    .await;
    let settings = FetchSettings {
        redirect_limit: 3,
        ..FetchSettings::default()
    };

    assert_eq!(
        load(&server, "/loop", settings).await.unwrap_err(),
        FailureKind::RedirectLimitExceeded
    );
}

#[tokio::test]
async fn non_documents_are_refused() {
    let server = serve(
        "/clip",
        ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "video/mp4"),
    )
    .await;

    assert_eq!(
        load(&server, "/clip", FetchSettings::default()).await.unwrap_err(),
        FailureKind::UnsupportedContentType {
            content_type: "video/mp4".to_string()
        }
    );
}

#[tokio::test]
async fn oversized_pages_are_refused() {
    let server = serve(
        "/huge",
        ResponseTemplate::new(200).set_body_raw("x".repeat(64), "text/plain"),
    )
    .await;
    let settings = FetchSettings {
        max_bytes: 32,
        ..FetchSettings::default()
    };

    assert_eq!(
        load(&server, "/huge", settings).await.unwrap_err(),
        FailureKind::TooLarge {
            max_bytes: 32,
            actual: Some(64)
        }
    );
}

#[tokio::test]
async fn stalled_server_times_out() {
    let server = serve(
        "/stall",
        ResponseTemplate::new(200).set_delay(Duration::from_millis(300)),
    )
    .await;
    let settings = FetchSettings {
        request_timeout: Duration::from_millis(40),
        ..FetchSettings::default()
    };

    assert_eq!(
        load(&server, "/stall", settings).await.unwrap_err(),
        FailureKind::Timeout
    );
}

#[tokio::test]
async fn malformed_url_is_rejected_before_connecting() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let err = fetcher.fetch("::not a url::").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

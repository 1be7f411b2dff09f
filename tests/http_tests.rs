// HTTP transport tests against a local mock server.
//
// The client is blocking, so every call runs under spawn_blocking while the
// mock server is driven by the test runtime.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wqp::{Connection, DEFAULT_VERSION, QueryParams, WqpError};

const DATES: &str = "/TelemetryDirect/api/Results/ReadingDates";
const DATA: &str = "/TelemetryDirect/api/Results/ResultData";
const DETAILS: &str = "/TelemetryDirect/api/Results/ResultDetails";

fn body_for(rid: u64) -> String {
    format!("ResultId,Timestamp,Value\n{rid},2019-10-01 00:00:00,1.0\n")
}

async fn mount_dates(server: &MockServer, rid: u64, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(DATES))
        .and(query_param("program", "MARSH"))
        .and(query_param("resultid", rid.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body_for(rid))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Serves every request with a 200 whose body is shorter than its
/// `Content-Length`, then drops the socket.
fn spawn_truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\nResultId,Timestamp\n36289,",
            );
        }
    });
    format!("http://{addr}")
}

fn connect(uri: String) -> Connection {
    Connection::builder("production", "marsh")
        .base_url(uri)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

// ============================================================================
// Connectivity
// ============================================================================

#[test]
fn test_is_connected_false_when_unreachable() {
    let c = Connection::builder("test", "emp")
        .base_url("http://127.0.0.1:1")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(!c.is_connected());
    assert!(matches!(c.checked(), Err(WqpError::Unreachable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_is_connected_true_when_base_url_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("WQP"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let ok = tokio::task::spawn_blocking(move || connect(uri).checked().is_ok())
        .await
        .unwrap();
    assert!(ok);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_is_connected_false_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let uri = server.uri();
    let connected = tokio::task::spawn_blocking(move || connect(uri).is_connected())
        .await
        .unwrap();
    assert!(!connected);
}

// ============================================================================
// Single queries
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_result_details_parses_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DETAILS))
        .and(query_param("program", "MARSH"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ResultId,Station,Analyte\n36289,HSL,SpC\n36290,HSL,Temp\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let table = tokio::task::spawn_blocking(move || connect(uri).result_details())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(1, "Analyte"), Some("Temp"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_is_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DETAILS))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = tokio::task::spawn_blocking(move || connect(uri).result_details())
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert!(err.to_string().contains("database offline"));
    assert!(err.to_string().contains("program=MARSH"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_text_is_returned_unparsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .and(query_param("x", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not,a\ntable,at,all"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let text = tokio::task::spawn_blocking(move || {
        let c = connect(uri.clone());
        c.basic_query_text(&format!("{uri}/raw"), &QueryParams::new().with("x", 1))
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(text, "not,a\ntable,at,all");
}

#[test]
fn test_truncated_body_is_an_error() {
    let c = connect(spawn_truncating_server());
    let err = c.result_details().unwrap_err();
    assert!(matches!(err, WqpError::Http(_)), "{err:?}");
}

// ============================================================================
// Concurrent queries
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_multi_query_keeps_input_order() {
    let server = MockServer::start().await;
    // Slowest first so completion order is the reverse of input order.
    mount_dates(&server, 1, 400).await;
    mount_dates(&server, 2, 200).await;
    mount_dates(&server, 3, 0).await;

    let uri = server.uri();
    let tables = tokio::task::spawn_blocking(move || connect(uri).result_dates(vec![1, 2, 3]))
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<_> = tables
        .iter()
        .map(|t| t.get(0, "ResultId").unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multi_query_with_progress_bar_keeps_input_order() {
    let server = MockServer::start().await;
    mount_dates(&server, 1, 300).await;
    mount_dates(&server, 2, 0).await;
    mount_dates(&server, 3, 150).await;

    let uri = server.uri();
    let tables = tokio::task::spawn_blocking(move || {
        Connection::builder("production", "marsh")
            .base_url(uri)
            .timeout(Duration::from_secs(5))
            .progress(true)
            .build()
            .unwrap()
            .result_dates(vec![1, 2, 3])
    })
    .await
    .unwrap()
    .unwrap();

    let ids: Vec<_> = tables
        .iter()
        .map(|t| t.get(0, "ResultId").unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn test_truncated_body_fails_the_batch() {
    let c = connect(spawn_truncating_server());
    let err = c
        .result_data_batch(
            vec![36289],
            "2019-10-01 00:00:00",
            "2019-10-02 00:00:00",
            DEFAULT_VERSION,
        )
        .unwrap_err();
    assert!(matches!(err, WqpError::Http(_)), "{err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multi_query_fails_as_a_whole() {
    let server = MockServer::start().await;
    // No call-count expectations: the batch may be abandoned before every request lands.
    Mock::given(method("GET"))
        .and(path(DATES))
        .and(query_param("resultid", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body_for(1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATES))
        .and(query_param("resultid", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = tokio::task::spawn_blocking(move || connect(uri).result_dates(vec![1, 2]))
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_result_data_drops_empty_sets() {
    let server = MockServer::start().await;
    for rid in [36289u64, 36290] {
        let body = if rid == 36290 {
            "ResultId,Timestamp,Value\n".to_string()
        } else {
            body_for(rid)
        };
        Mock::given(method("GET"))
            .and(path(DATA))
            .and(query_param("program", "MARSH"))
            .and(query_param("resultid", rid.to_string()))
            .and(query_param("start", "2019-10-01:00:00:00"))
            .and(query_param("end", "2020-08-30:23:59:59"))
            .and(query_param("version", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let uri = server.uri();
    let batch = tokio::task::spawn_blocking(move || {
        connect(uri).result_data_batch(
            vec![36289, 36290],
            "2019-10-01 00:00:00",
            "2020-08-30 23:59:59",
            DEFAULT_VERSION,
        )
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(batch.empty, vec![36290]);
    assert_eq!(batch.tables.len(), 1);
    assert_eq!(batch.tables[0].0, 36289);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_validation_error_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        connect(uri).result_data(
            vec![1, 2, 3],
            vec!["2019-10-01 00:00:00", "2019-10-02 00:00:00"],
            vec!["2019-10-03 00:00:00", "2019-10-04 00:00:00"],
            DEFAULT_VERSION,
        )
    })
    .await
    .unwrap()
    .unwrap_err();
    assert!(matches!(err, WqpError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_id_list_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let tables = tokio::task::spawn_blocking(move || connect(uri).result_dates(Vec::<u64>::new()))
        .await
        .unwrap()
        .unwrap();
    assert!(tables.is_empty());
}

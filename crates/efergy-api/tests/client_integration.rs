// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of efergy-rs.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::time::Duration;

use efergy_api::{EfergyClient, EfergyError, Period, ReadingRequest};
use mockito::{Matcher, Server};
use serde_json::json;

const TOKEN: &str = "ur1234567-0abc12de3f456gh7ij89k012";

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn client_for(server: &Server) -> EfergyClient {
    EfergyClient::new(TOKEN)
        .unwrap()
        .with_base_url(server.url())
}

/// Accepts connections and never answers them
async fn silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn instant_reading_end_to_end() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getInstant")
        .match_query(Matcher::UrlEncoded("token".into(), TOKEN.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"reading": 123.4}]).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let reading = client.get_reading("instant_readings").await.unwrap();

    assert_eq!(reading.as_f64(), Some(123.4));
    mock.assert_async().await;
}

#[tokio::test]
async fn offset_from_timezone_reaches_the_wire() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getBudget")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("token".into(), TOKEN.into()),
            Matcher::UrlEncoded("offset".into(), "-60".into()),
        ]))
        .with_status(200)
        .with_body(json!({"status": "ok", "monthly_budget": 250.0}).to_string())
        .create_async()
        .await;

    let client = client_for(&server).with_utc_offset("+01:00").unwrap();
    let reading = client.get_reading("budget").await.unwrap();

    assert_eq!(reading.as_str(), Some("ok"));
    mock.assert_async().await;
}

#[tokio::test]
async fn current_values_for_one_sensor() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getCurrentValuesSummary")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                {"cid": "PWER", "data": [{"1638552960000": 218}], "sid": "728386", "units": "kWm", "age": 5},
                {"cid": "PWER_GAC", "data": [{"1638552960000": 1808}], "sid": "0", "units": null, "age": 5}
            ])
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);

    let all = client.get_reading("current_values").await.unwrap();
    assert_eq!(all.sensors().unwrap()["728386"], json!(218));

    let one = client
        .get_reading_with(&ReadingRequest::new("current_values").with_sid(0))
        .await
        .unwrap();
    assert_eq!(one.as_f64(), Some(1808.0));

    mock.assert_async().await;
}

#[tokio::test]
async fn unknown_reading_type_never_hits_the_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.get_reading("voltage").await;

    assert!(matches!(result, Err(EfergyError::InvalidReadingType(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_period_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getCost")
        .match_query(Matcher::UrlEncoded("period".into(), "week".into()))
        .with_status(200)
        .with_body(
            json!({"status": "error", "error": {"id": 400, "desc": "Bad Request", "more": "period not supported"}})
                .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .get_reading_with(&ReadingRequest::new("cost").with_period(Period::Week))
        .await;

    assert!(matches!(result, Err(EfergyError::InvalidPeriod(_))));
    mock.assert_async().await;
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_surfaces_as_invalid_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getInstant")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let result = client_for(&server).get_reading("instant_readings").await;

    assert!(matches!(result, Err(EfergyError::InvalidToken)));
    mock.assert_async().await;
}

#[tokio::test]
async fn bad_token_payload_surfaces_as_invalid_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getInstant")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"status": "error", "description": "bad token"}).to_string())
        .create_async()
        .await;

    let result = client_for(&server).get_reading("instant_readings").await;

    assert!(matches!(result, Err(EfergyError::InvalidToken)));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_surfaces_as_service_unavailable() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getInstant")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let result = client_for(&server).get_reading("instant_readings").await;

    assert!(matches!(
        result,
        Err(EfergyError::ServiceUnavailable {
            status: Some(500),
            ..
        })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn timeout_surfaces_as_connect_error() {
    let base_url = silent_server().await;
    let client = EfergyClient::new(TOKEN)
        .unwrap()
        .with_base_url(base_url)
        .with_timeout(Duration::from_millis(200));

    let result = client.get_reading("instant_readings").await;

    assert!(matches!(result, Err(EfergyError::ConnectError(_))));
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scoped_session_closes_on_exit_and_reopens() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getInstant")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"reading": 1580}).to_string())
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    assert!(!client.is_session_open());

    {
        let session = client.open().unwrap();
        assert!(session.is_session_open());
        session.get_reading("instant_readings").await.unwrap();
    }
    assert!(!client.is_session_open());

    {
        let session = client.open().unwrap();
        let reading = session.get_reading("instant_readings").await.unwrap();
        assert_eq!(reading.as_f64(), Some(1580.0));
    }
    assert!(!client.is_session_open());

    mock.assert_async().await;
}

#[tokio::test]
async fn nested_scopes_reuse_the_session() {
    let server = Server::new_async().await;
    let client = client_for(&server);

    let outer = client.open().unwrap();
    {
        let _inner = outer.open().unwrap();
        assert!(client.is_session_open());
    }
    assert!(client.is_session_open());
    drop(outer);
    assert!(!client.is_session_open());
}

#[tokio::test]
async fn request_outside_scope_opens_session_lazily() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getBudget")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"status": "ok"}).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    client.get_reading("budget").await.unwrap();
    assert!(client.is_session_open());

    client.close();
    assert!(!client.is_session_open());
    mock.assert_async().await;
}

#[tokio::test]
async fn external_session_is_left_open() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getBudget")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"status": "ok"}).to_string())
        .create_async()
        .await;

    let http = reqwest::Client::new();
    let client = client_for(&server).with_http_client(http);
    {
        let session = client.open().unwrap();
        session.get_reading("budget").await.unwrap();
    }
    assert!(client.is_session_open());
    mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_requests_share_one_client() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/getInstant")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"reading": 42}).to_string())
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server);
    let session = client.open().unwrap();
    let (a, b, c) = tokio::join!(
        session.get_reading("instant_readings"),
        session.get_reading("instant_readings"),
        session.get_reading("instant_readings"),
    );

    for reading in [a, b, c] {
        assert_eq!(reading.unwrap().as_f64(), Some(42.0));
    }
    mock.assert_async().await;
}

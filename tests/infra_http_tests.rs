//! HTTP-based integration tests for the ledger gateway and backend sink.
//!
//! Uses `wiremock` to mock the Solana JSON-RPC endpoint and the backend
//! transaction record API.

use secrecy::SecretString;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use solana_confirmation_monitor::domain::{
    AppError, BackendError, BackendTxId, LedgerError, LedgerStatus,
};
use solana_confirmation_monitor::domain::{BackendStatusSink, LedgerStatusGateway, SinkOutcome};
use solana_confirmation_monitor::infra::{HttpBackendSink, RpcLedgerGateway};

const TEST_SIG: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d";

/// getSignatureStatuses envelope with the given value slot
fn signature_statuses_response(value: serde_json::Value) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "context": { "slot": 12345 },
            "value": [value]
        }
    })
}

mod ledger_gateway_tests {
    use super::*;

    #[tokio::test]
    async fn unobserved_signature_is_pending() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(signature_statuses_response(serde_json::Value::Null)),
            )
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        let status = gateway.signature_status(TEST_SIG).await.unwrap();
        assert_eq!(status, LedgerStatus::Pending);
    }

    #[tokio::test]
    async fn observed_status_without_err_is_confirmed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(signature_statuses_response(
                json!({
                    "slot": 12300,
                    "confirmations": null,
                    "err": null,
                    "confirmationStatus": "finalized"
                }),
            )))
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        let status = gateway.signature_status(TEST_SIG).await.unwrap();
        assert_eq!(status, LedgerStatus::Confirmed);
    }

    #[tokio::test]
    async fn observed_status_with_err_is_failed_with_detail() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(signature_statuses_response(
                json!({
                    "slot": 12300,
                    "err": { "InstructionError": [0, { "Custom": 6 }] },
                    "confirmationStatus": "finalized"
                }),
            )))
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        match gateway.signature_status(TEST_SIG).await.unwrap() {
            LedgerStatus::Failed(detail) => assert!(detail.contains("InstructionError")),
            other => panic!("expected failed status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rpc_error_object_maps_to_ledger_rpc_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "Invalid param: WrongSize" }
            })))
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        match gateway.signature_status(TEST_SIG).await {
            Err(AppError::Ledger(LedgerError::Rpc(msg))) => {
                assert!(msg.contains("-32602"));
                assert!(msg.contains("WrongSize"));
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_json_body_is_a_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        assert!(matches!(
            gateway.signature_status(TEST_SIG).await,
            Err(AppError::Ledger(LedgerError::MalformedResponse(_)))
        ));
    }

    #[tokio::test]
    async fn missing_value_array_is_a_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "context": { "slot": 1 } }
            })))
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        assert!(matches!(
            gateway.signature_status(TEST_SIG).await,
            Err(AppError::Ledger(LedgerError::MalformedResponse(_)))
        ));
    }

    #[tokio::test]
    async fn health_check_accepts_ok() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": "ok" })),
            )
            .mount(&mock_server)
            .await;

        let gateway = RpcLedgerGateway::with_defaults(&mock_server.uri()).unwrap();
        assert_ok!(gateway.health_check().await);
    }
}

mod backend_sink_tests {
    use super::*;

    #[tokio::test]
    async fn confirm_puts_to_the_confirmed_endpoint() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/transactions/tr_1/confirmed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "tr_1"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base = format!("{}/transactions", mock_server.uri());
        let sink = HttpBackendSink::with_defaults(&base, None).unwrap();
        let id = BackendTxId::parse("tr_1").unwrap();
        assert_eq!(sink.confirm(&id).await.unwrap(), SinkOutcome::Updated);
    }

    #[tokio::test]
    async fn fail_puts_to_the_failed_endpoint_with_bearer_auth() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/transactions/tr_2/failed"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "tr_2"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base = format!("{}/transactions", mock_server.uri());
        let sink = HttpBackendSink::with_defaults(
            &base,
            Some(SecretString::from("secret-token".to_string())),
        )
        .unwrap();
        let id = BackendTxId::parse("tr_2").unwrap();
        assert_eq!(sink.fail(&id).await.unwrap(), SinkOutcome::Updated);
    }

    #[tokio::test]
    async fn placeholder_ids_short_circuit_without_any_http_call() {
        let mock_server = MockServer::start().await;
        // Any request reaching the server fails the test
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let base = format!("{}/transactions", mock_server.uri());
        let sink = HttpBackendSink::with_defaults(&base, None).unwrap();
        let id = BackendTxId::placeholder(TEST_SIG);

        assert_eq!(
            sink.confirm(&id).await.unwrap(),
            SinkOutcome::SkippedPlaceholder
        );
        assert_eq!(
            sink.fail(&id).await.unwrap(),
            SinkOutcome::SkippedPlaceholder
        );
    }

    #[tokio::test]
    async fn non_success_status_surfaces_code_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
            .mount(&mock_server)
            .await;

        let base = format!("{}/transactions", mock_server.uri());
        let sink = HttpBackendSink::with_defaults(&base, None).unwrap();
        let id = BackendTxId::parse("tr_3").unwrap();

        match sink.confirm(&id).await {
            Err(AppError::Backend(BackendError::Status { code, body })) => {
                assert_eq!(code, 503);
                assert!(body.contains("maintenance"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}

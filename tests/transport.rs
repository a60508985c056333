//! Bridge client behaviour against a mock bridge over real HTTP.

mod common;

use common::{MockBridge, Reply};
use reqwest::header::HeaderValue;
use serde_json::json;

use midnight_bridge::bridge::types::TxState;
use midnight_bridge::signing::{SignableRequest, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use midnight_bridge::{Address, BridgeClient, BridgeError, ContractCall, RequestSigner, TxHash};

fn client(mock: &MockBridge) -> BridgeClient {
    BridgeClient::new(mock.config(), None).unwrap()
}

#[tokio::test]
async fn test_health_recovers_from_dropped_connection() {
    let mock = MockBridge::start(|_, n| {
        if n == 0 {
            Reply::Drop
        } else {
            Reply::json(200, json!({ "status": "ok" }))
        }
    })
    .await;

    let health = client(&mock).get_health().await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(mock.count(), 2);
}

#[tokio::test]
async fn test_submit_without_tx_hash_is_rejected() {
    let mock = MockBridge::start(|_, _| Reply::json(200, json!({ "invalid": "response" }))).await;

    let err = client(&mock)
        .submit_transaction(&json!({ "entrypoint": "transfer" }))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "network");
    assert_eq!(err.message(), "Missing tx_hash in response");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock = MockBridge::start(|_, _| Reply::json(422, json!({ "message": "bad arguments" }))).await;

    let err = client(&mock)
        .submit_transaction(&json!({}))
        .await
        .unwrap_err();

    assert_eq!(mock.count(), 1);
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.message(), "bad arguments");
}

#[tokio::test]
async fn test_server_errors_are_retried_until_budget_is_spent() {
    let mock = MockBridge::start(|_, _| Reply::json(503, json!({ "error": "overloaded" }))).await;

    let err = client(&mock).get_health().await.unwrap_err();

    // One initial attempt plus max_retries (2)
    assert_eq!(mock.count(), 3);
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.message(), "overloaded");
}

#[tokio::test]
async fn test_server_error_then_success() {
    let mock = MockBridge::start(|_, n| {
        if n < 2 {
            Reply::Respond(500, "oops".to_string())
        } else {
            Reply::json(200, json!({ "txHash": "0xabc" }))
        }
    })
    .await;

    let hash = client(&mock).submit_transaction(&json!({})).await.unwrap();

    assert_eq!(hash.as_str(), "0xabc");
    assert_eq!(mock.count(), 3);
}

#[tokio::test]
async fn test_camel_case_fields_are_accepted() {
    let mock = MockBridge::start(|req, _| {
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/transactions/0x1/status");
        Reply::json(200, json!({ "status": "confirmed", "blockHeight": 42 }))
    })
    .await;

    let status = client(&mock)
        .get_transaction_status(&TxHash::new("0x1").unwrap())
        .await
        .unwrap();

    assert_eq!(status.status, TxState::Confirmed);
    assert_eq!(status.block_height, Some(42));
    assert!(status.is_final());
}

#[tokio::test]
async fn test_snake_case_wins_over_camel_case() {
    let mock = MockBridge::start(|_, _| Reply::json(200, json!({ "tx_hash": "0xsnake", "txHash": "0xcamel" }))).await;

    let hash = client(&mock).submit_transaction(&json!({})).await.unwrap();
    assert_eq!(hash.as_str(), "0xsnake");
}

#[tokio::test]
async fn test_outgoing_requests_carry_verifiable_signatures() {
    let mock = MockBridge::start(|_, _| Reply::json(200, json!({ "tx_hash": "0x1" }))).await;
    let signer = RequestSigner::new("shared-secret", 300).unwrap();
    let client = BridgeClient::new(mock.config(), Some(signer.clone())).unwrap();

    client
        .submit_transaction(&json!({ "entrypoint": "transfer", "public_args": { "amount": 5 } }))
        .await
        .unwrap();

    let recorded = &mock.requests()[0];
    let timestamp = recorded.header(TIMESTAMP_HEADER).unwrap();
    let signature = recorded.header(SIGNATURE_HEADER).unwrap();
    assert_eq!(signature.len(), 64);

    let mut incoming = SignableRequest::new(&recorded.method, &recorded.path, recorded.body.clone());
    incoming
        .headers
        .insert(TIMESTAMP_HEADER, HeaderValue::from_str(timestamp).unwrap());
    assert!(signer.verify(&incoming, signature));

    // A different key does not verify
    let other = RequestSigner::new("other-secret", 300).unwrap();
    assert!(!other.verify(&incoming, signature));
}

#[tokio::test]
async fn test_rejected_signature_is_retried_with_fresh_headers() {
    let mock = MockBridge::start(|_, n| {
        if n == 0 {
            Reply::json(401, json!({ "message": "stale signature" }))
        } else {
            Reply::json(200, json!({ "status": "ok" }))
        }
    })
    .await;
    let signer = RequestSigner::new("shared-secret", 300).unwrap();
    let client = BridgeClient::new(mock.config(), Some(signer)).unwrap();

    client.get_health().await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.header(SIGNATURE_HEADER).is_some()));
}

#[tokio::test]
async fn test_persistent_signature_rejection_is_a_network_error() {
    let mock = MockBridge::start(|_, _| Reply::json(401, json!({ "message": "bad signature" }))).await;
    let signer = RequestSigner::new("wrong", 300).unwrap();
    let client = BridgeClient::new(mock.config(), Some(signer)).unwrap();

    let err = client.get_health().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.message().contains("Signature rejected"));
}

#[tokio::test]
async fn test_missing_proof_is_a_proof_failure() {
    let mock = MockBridge::start(|req, _| {
        assert_eq!(req.path, "/proofs/generate");
        assert_eq!(req.json()["private_args"]["secret"], json!(7));
        Reply::json(200, json!({ "public_outputs": {} }))
    })
    .await;
    let call = ContractCall::write("0xA", "vote").unwrap().with_private_arg("secret", 7);

    let err = client(&mock).generate_proof(&call).await.unwrap_err();

    assert!(matches!(err, BridgeError::ProofFailed(_)));
}

#[tokio::test]
async fn test_proof_transport_failure_is_a_proof_failure() {
    let mock = MockBridge::start(|_, _| Reply::json(400, json!({ "error": "circuit mismatch" }))).await;
    let call = ContractCall::write("0xA", "vote").unwrap().with_private_arg("secret", 7);

    let err = client(&mock).generate_proof(&call).await.unwrap_err();

    assert_eq!(err, BridgeError::ProofFailed("circuit mismatch".to_string()));
}

#[tokio::test]
async fn test_proof_accepts_camel_case() {
    let mock = MockBridge::start(|_, _| {
        Reply::json(200, json!({ "proof": "0xp", "publicOutputs": { "n": 1 }, "generationTime": 1.5 }))
    })
    .await;
    let call = ContractCall::write("0xA", "vote").unwrap().with_private_arg("secret", 7);

    let proof = client(&mock).generate_proof(&call).await.unwrap();

    assert_eq!(proof.proof, "0xp");
    assert_eq!(proof.public_outputs, json!({ "n": 1 }));
    assert_eq!(proof.generation_time, Some(1.5));
}

#[tokio::test]
async fn test_failed_call_is_a_contract_error() {
    let mock = MockBridge::start(|_, _| Reply::json(200, json!({ "success": false, "error": "revert: insufficient" }))).await;

    let err = client(&mock)
        .call_contract(&ContractCall::read("0xA", "balance").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, BridgeError::Contract("revert: insufficient".to_string()));
}

#[tokio::test]
async fn test_call_transport_failure_is_a_contract_error() {
    let mock = MockBridge::start(|_, _| Reply::json(404, json!({ "message": "unknown contract" }))).await;

    let err = client(&mock)
        .call_contract(&ContractCall::read("0xA", "balance").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, BridgeError::Contract("unknown contract".to_string()));
}

#[tokio::test]
async fn test_unhealthy_bridge_is_a_network_error() {
    let mock = MockBridge::start(|_, _| Reply::json(200, json!({ "status": "degraded", "message": "syncing" }))).await;

    let err = client(&mock).get_health().await.unwrap_err();

    assert_eq!(err.kind(), "network");
    assert!(err.message().contains("syncing"));
}

#[tokio::test]
async fn test_deploy_and_join() {
    let mock = MockBridge::start(|req, _| match req.path.as_str() {
        "/contracts/deploy" => Reply::json(200, json!({ "contractAddress": "0xNEW", "txHash": "0xd" })),
        "/contracts/join" => {
            assert_eq!(req.json()["contract_address"], json!("0xNEW"));
            Reply::json(200, json!({ "success": true }))
        }
        _ => Reply::json(404, json!({})),
    })
    .await;
    let client = client(&mock);

    let deployed = client.deploy_contract("token", &Default::default()).await.unwrap();
    assert_eq!(deployed.contract_address.as_str(), "0xNEW");
    assert_eq!(deployed.tx_hash.unwrap().as_str(), "0xd");

    client.join_contract(&deployed.contract_address).await.unwrap();
}

#[tokio::test]
async fn test_wallet_operations() {
    let mock = MockBridge::start(|req, _| match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/wallet/address") => Reply::json(200, json!({ "address": "0xWALLET" })),
        ("GET", "/wallet/balance") => Reply::json(200, json!({ "balance": 1500 })),
        ("POST", "/wallet/transfer") => {
            assert_eq!(req.json(), json!({ "to": "0xB", "amount": "10" }));
            Reply::json(200, json!({ "tx_hash": "0xt" }))
        }
        _ => Reply::json(404, json!({})),
    })
    .await;
    let client = client(&mock);

    assert_eq!(client.get_wallet_address().await.unwrap().as_str(), "0xWALLET");
    assert_eq!(client.get_wallet_balance().await.unwrap(), "1500");
    let hash = client
        .wallet_transfer(&Address::new("0xB").unwrap(), "10")
        .await
        .unwrap();
    assert_eq!(hash.as_str(), "0xt");
}

#[tokio::test]
async fn test_network_metadata_must_be_an_object() {
    let mock = MockBridge::start(|_, n| {
        if n == 0 {
            Reply::json(200, json!({ "network": "testnet", "height": 10 }))
        } else {
            Reply::json(200, json!([1, 2, 3]))
        }
    })
    .await;
    let client = client(&mock);

    let meta = client.get_network_metadata().await.unwrap();
    assert_eq!(meta["network"], json!("testnet"));
    assert!(client.get_network_metadata().await.is_err());
}

#[tokio::test]
async fn test_wait_for_confirmation_polls_until_final() {
    let mock = MockBridge::start(|_, n| {
        if n < 2 {
            Reply::json(200, json!({ "status": "pending" }))
        } else {
            Reply::json(200, json!({ "status": "confirmed", "block_height": 7 }))
        }
    })
    .await;

    let status = client(&mock)
        .wait_for_confirmation(
            &TxHash::new("0x1").unwrap(),
            std::time::Duration::from_secs(5),
            std::time::Duration::from_millis(10),
        )
        .await
        .unwrap();

    assert_eq!(status.block_height, Some(7));
    assert_eq!(mock.count(), 3);
}

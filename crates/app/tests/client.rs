mod common;

use reqwest::StatusCode;

use ::common::prelude::CipherMode;
use hybrid_ecc::http_server::api::client::{ApiClient, ApiError};
use hybrid_ecc::http_server::api::v0::{
    DecryptRequest, EncryptRequest, ExchangeRequest, KeysRequest, PerformanceRequest,
    ResetRequest,
};

use crate::common::{serve, setup};

async fn prepare(client: &mut ApiClient) {
    let keys = client.call(KeysRequest::default()).await.unwrap();
    assert!(keys.success);
    assert_eq!(keys.initiator.name, "alice");

    let exchange = client.call(ExchangeRequest {}).await.unwrap();
    assert!(exchange.keys_match);
}

#[tokio::test]
async fn test_client_round_trip_both_modes() {
    let daemon = setup();
    let mut client = serve(daemon.router.clone()).await;
    prepare(&mut client).await;

    for mode in [CipherMode::Gcm, CipherMode::Cbc] {
        let sealed = client
            .call(EncryptRequest {
                filename: "hello.txt".into(),
                data: b"hello test".to_vec(),
                mode,
            })
            .await
            .unwrap();
        assert_eq!(sealed.algorithm, mode.algorithm());
        assert_eq!(sealed.encrypted_filename, "hello.txt.enc");
        assert_eq!(sealed.nonce.is_some(), mode == CipherMode::Gcm);
        assert_eq!(sealed.iv.is_some(), mode == CipherMode::Cbc);

        let package = client.download(&sealed.encrypted_filename).await.unwrap();
        assert_eq!(package.len(), sealed.encrypted_size);

        let opened = client
            .call(DecryptRequest {
                filename: sealed.encrypted_filename.clone(),
                data: package,
            })
            .await
            .unwrap();
        assert_eq!(opened.algorithm, mode.algorithm());
        assert_eq!(opened.decrypted_filename, "hello.txt");
        assert_eq!(opened.decrypted_size, 10);

        let plaintext = client.download(&opened.decrypted_filename).await.unwrap();
        assert_eq!(plaintext, b"hello test");
    }

    let performance = client.call(PerformanceRequest {}).await.unwrap();
    assert_eq!(performance.statistics.encryption_count, 2);
    assert_eq!(performance.statistics.decryption_count, 2);
}

#[tokio::test]
async fn test_client_reports_error_field() {
    let daemon = setup();
    let mut client = serve(daemon.router.clone()).await;

    let err = client.call(ExchangeRequest {}).await.unwrap_err();
    match err {
        ApiError::HttpStatus(status, message) => {
            assert_eq!(status, StatusCode::CONFLICT);
            assert!(message.starts_with("Keys not generated"), "{}", message);
        }
        other => panic!("unexpected error: {}", other),
    }

    prepare(&mut client).await;
    let err = client
        .call(DecryptRequest {
            filename: "bad.enc".into(),
            data: br#"{"iv":"AAAA","ciphertext":"AAAA"}"#.to_vec(),
        })
        .await
        .unwrap_err();
    match err {
        ApiError::HttpStatus(status, message) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(message.starts_with("malformed package: "), "{}", message);
        }
        other => panic!("unexpected error: {}", other),
    }

    let err = client.download("missing.txt").await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus(StatusCode::NOT_FOUND, _)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_encrypts_all_complete() {
    let daemon = setup();
    let mut client = serve(daemon.router.clone()).await;
    prepare(&mut client).await;

    let payload = vec![7u8; 1024 * 1024];
    let requests = (0..4).map(|i| {
        let mut client = client.clone();
        let data = payload.clone();
        async move {
            client
                .call(EncryptRequest {
                    filename: format!("part{}.bin", i),
                    data,
                    mode: CipherMode::Gcm,
                })
                .await
        }
    });
    let results = futures::future::join_all(requests).await;
    for result in results {
        assert_eq!(result.unwrap().original_size, 1024 * 1024);
    }

    let performance = client.call(PerformanceRequest {}).await.unwrap();
    assert_eq!(performance.statistics.encryption_count, 4);

    let reset = client.call(ResetRequest {}).await.unwrap();
    assert!(reset.files_removed >= 4);
}

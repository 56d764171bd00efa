//! Requests the provider must refuse, and how the refusal reaches the caller.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        client_for, pay_out_request, spawn_provider, PayOutResponse, ProviderOptions, PAY_OUT,
    };
    use settle_auth::{ClientError, Clock, Code, ProtocolVersion, SystemClock};
    use settle_crypto::PrivateKey;
    use std::sync::Arc;

    fn rpc_message(err: &ClientError) -> &str {
        match err {
            ClientError::Rpc(rpc) => &rpc.message,
            other => panic!("expected an RPC error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_signer_is_unauthenticated() {
        let network = PrivateKey::random();
        let intruder = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();
        let client = client_for(&provider, &intruder, ProtocolVersion::V2, None);

        let err = client
            .call::<_, PayOutResponse>(PAY_OUT, &pay_out_request("pay-1", "100"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::Unauthenticated));
        assert_eq!(rpc_message(&err), "request signed with unknown public key");

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_skewed_client_clock_is_rejected() {
        let network = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();
        let behind: Arc<dyn Clock> = Arc::new(|| SystemClock.now_millis() - 120_000);
        let client = client_for(&provider, &network, ProtocolVersion::V2, Some(behind));

        let err = client
            .call::<_, PayOutResponse>(PAY_OUT, &pay_out_request("pay-1", "100"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert_eq!(
            rpc_message(&err),
            "timestamp is outside the allowed time window"
        );

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_v1_client_against_v2_provider() {
        let network = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();
        let client = client_for(&provider, &network, ProtocolVersion::V1, None);

        let err = client
            .call::<_, PayOutResponse>(PAY_OUT, &pay_out_request("pay-1", "100"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert_eq!(
            rpc_message(&err),
            "missing required header: X-Signature-Timestamp"
        );

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let network = PrivateKey::random();
        let options = ProviderOptions {
            max_body_size: 128,
            ..ProviderOptions::default()
        };
        let provider = spawn_provider(&network, options).await.unwrap();
        let client = client_for(&provider, &network, ProtocolVersion::V2, None);

        let big_id = "x".repeat(256);
        let err = client
            .call::<_, PayOutResponse>(PAY_OUT, &pay_out_request(&big_id, "100"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert_eq!(rpc_message(&err), "max payload size of 128 bytes exceeded");

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsigned_request_is_rejected() {
        let network = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();

        let response = reqwest::Client::new()
            .post(format!("http://{}{}", provider.local_addr(), PAY_OUT))
            .json(&pay_out_request("pay-1", "100"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "invalid_argument");
        assert_eq!(body["message"], "missing required header: X-Public-Key");

        provider.shutdown().await.unwrap();
    }
}

//! Successful signed round trips.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        client_for, pay_out_request, spawn_provider, PayOutResponse, ProviderOptions, PAY_OUT,
    };
    use settle_auth::{Code, ProtocolVersion};
    use settle_crypto::PrivateKey;

    #[tokio::test]
    async fn test_v2_round_trip() {
        let network = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();
        let client = client_for(&provider, &network, ProtocolVersion::V2, None);

        let reply: PayOutResponse = client
            .call(PAY_OUT, &pay_out_request("pay-1", "100"))
            .await
            .unwrap();
        assert_eq!(
            reply,
            PayOutResponse {
                payment_id: "pay-1".into(),
                accepted: true,
            }
        );

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_v1_round_trip() {
        let network = PrivateKey::random();
        let options = ProviderOptions {
            protocol: ProtocolVersion::V1,
            ..ProviderOptions::default()
        };
        let provider = spawn_provider(&network, options).await.unwrap();
        let client = client_for(&provider, &network, ProtocolVersion::V1, None);

        let reply: PayOutResponse = client
            .call(PAY_OUT, &pay_out_request("pay-v1", "1"))
            .await
            .unwrap();
        assert!(reply.accepted);

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_handler_error_reaches_client() {
        let network = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();
        let client = client_for(&provider, &network, ProtocolVersion::V2, None);

        let err = client
            .call::<_, PayOutResponse>(PAY_OUT, &pay_out_request("pay-0", "0"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert!(err.to_string().contains("amount must be positive"));

        provider.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_client() {
        let network = PrivateKey::random();
        let provider = spawn_provider(&network, ProviderOptions::default())
            .await
            .unwrap();
        let client = client_for(&provider, &network, ProtocolVersion::V2, None);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    let id = format!("pay-{i}");
                    let reply: PayOutResponse =
                        client.call(PAY_OUT, &pay_out_request(&id, "5")).await?;
                    Ok::<_, settle_auth::ClientError>((id, reply))
                })
            })
            .collect();

        for task in tasks {
            let (id, reply) = task.await.unwrap().unwrap();
            assert_eq!(reply.payment_id, id);
        }

        provider.shutdown().await.unwrap();
    }
}

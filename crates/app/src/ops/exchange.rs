use hybrid_ecc::http_server::api::client::ApiError;
use hybrid_ecc::http_server::api::v0::{ExchangeRequest, ExchangeResponse};

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for ExchangeRequest {
    type Error = ExchangeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: ExchangeResponse = client.call(self.clone()).await?;

        let verdict = if response.keys_match {
            "keys match"
        } else {
            "KEYS DIFFER"
        };
        Ok(format!(
            "Key exchange on {}: {} (fingerprint: {})\n\
             - initiator: {:.6}s (ECDH {:.6}s, HKDF {:.6}s)\n\
             - responder: {:.6}s (ECDH {:.6}s, HKDF {:.6}s)",
            response.curve,
            verdict,
            response.key_fingerprint.as_deref().unwrap_or("none"),
            response.initiator.total_time,
            response.initiator.computation_time,
            response.initiator.derivation_time,
            response.responder.total_time,
            response.responder.computation_time,
            response.responder.derivation_time,
        ))
    }
}

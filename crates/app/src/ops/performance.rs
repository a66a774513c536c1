use hybrid_ecc::http_server::api::client::ApiError;
use hybrid_ecc::http_server::api::v0::{PerformanceRequest, PerformanceResponse};

#[derive(Debug, thiserror::Error)]
pub enum PerformanceError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for PerformanceRequest {
    type Error = PerformanceError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: PerformanceResponse = client.call(self.clone()).await?;
        let stats = &response.statistics;

        let mut output = format!(
            "{} operations\n\
             - key generation: {} (avg {:.6}s)\n\
             - key exchange: {} (avg {:.6}s)\n\
             - encryption: {} (avg {:.6}s)\n\
             - decryption: {} (avg {:.6}s)",
            stats.total_operations,
            stats.key_generation_count,
            stats.average_key_generation_time,
            stats.key_exchange_count,
            stats.average_key_exchange_time,
            stats.encryption_count,
            stats.average_encryption_time,
            stats.decryption_count,
            stats.average_decryption_time,
        );
        for entry in &response.logs {
            output.push_str(&format!(
                "\n{} {} {:.6}s",
                entry.timestamp.to_rfc3339(),
                entry.operation,
                entry.total_time
            ));
        }
        Ok(output)
    }
}

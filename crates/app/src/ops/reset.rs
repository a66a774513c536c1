use hybrid_ecc::http_server::api::client::ApiError;
use hybrid_ecc::http_server::api::v0::{ResetRequest, ResetResponse};

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for ResetRequest {
    type Error = ResetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: ResetResponse = client.call(self.clone()).await?;
        Ok(format!(
            "{} ({} files removed)",
            response.message, response.files_removed
        ))
    }
}

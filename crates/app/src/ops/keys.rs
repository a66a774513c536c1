use hybrid_ecc::http_server::api::client::ApiError;
use hybrid_ecc::http_server::api::v0::{KeysRequest, KeysResponse};

#[derive(Debug, thiserror::Error)]
pub enum KeysError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for KeysRequest {
    type Error = KeysError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: KeysResponse = client.call(self.clone()).await?;

        let mut output = format!(
            "Generated {} key pairs in {:.6}s",
            response.curve, response.total_generation_time
        );
        for party in [&response.initiator, &response.responder] {
            output.push_str(&format!(
                "\n- {}: {} / {} ({:.6}s)",
                party.name, party.private_file, party.public_file, party.generation_time
            ));
        }
        Ok(output)
    }
}

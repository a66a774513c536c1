use std::path::PathBuf;

use clap::Args;

use common::prelude::CipherMode;
use hybrid_ecc::http_server::api::client::ApiError;
use hybrid_ecc::http_server::api::v0::{EncryptRequest, EncryptResponse};

#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    /// File to encrypt
    #[arg(long)]
    pub path: PathBuf,

    /// Cipher mode: gcm or cbc
    #[arg(long, default_value_t = CipherMode::Gcm)]
    pub mode: CipherMode,

    /// Where to write the package (defaults to <path>.enc)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a file path: {0}")]
    InvalidPath(String),
}

impl Encrypt {
    fn out_path(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            let mut name = self.path.clone().into_os_string();
            name.push(".enc");
            PathBuf::from(name)
        })
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Encrypt {
    type Error = EncryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        let filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| EncryptError::InvalidPath(self.path.display().to_string()))?;
        let data = tokio::fs::read(&self.path).await?;

        let response: EncryptResponse = client
            .call(EncryptRequest {
                filename,
                data,
                mode: self.mode,
            })
            .await?;

        let package = client.download(&response.encrypted_filename).await?;
        let out = self.out_path();
        tokio::fs::write(&out, &package).await?;

        let growth = match response.size_increase_percent {
            Some(pct) => format!("{:+.2}%", pct),
            None => "n/a".to_string(),
        };
        Ok(format!(
            "Encrypted {} with {} in {:.6}s -> {}\n\
             - {} bytes -> {} bytes ({})",
            response.original_filename,
            response.algorithm,
            response.encryption_time,
            out.display(),
            response.original_size,
            response.encrypted_size,
            growth
        ))
    }
}

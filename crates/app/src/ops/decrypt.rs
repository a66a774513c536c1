use std::path::PathBuf;

use clap::Args;

use common::crypto::DEFAULT_FILENAME;
use hybrid_ecc::daemon::file_store::secure_filename;
use hybrid_ecc::http_server::api::client::ApiError;
use hybrid_ecc::http_server::api::v0::{DecryptRequest, DecryptResponse};

#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    /// Encrypted package to open
    #[arg(long)]
    pub path: PathBuf,

    /// Where to write the plaintext (defaults to the package's file name in the current directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a file path: {0}")]
    InvalidPath(String),
}

impl Decrypt {
    /// `--out`, or the name the daemon reported reduced to a bare file name
    /// in the current directory
    fn out_path(&self, reported_name: &str) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            PathBuf::from(
                secure_filename(reported_name).unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            )
        })
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Decrypt {
    type Error = DecryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        let filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DecryptError::InvalidPath(self.path.display().to_string()))?;
        let data = tokio::fs::read(&self.path).await?;

        let response: DecryptResponse = client.call(DecryptRequest { filename, data }).await?;

        let plaintext = client.download(&response.decrypted_filename).await?;
        let out = self.out_path(&response.decrypted_filename);
        tokio::fs::write(&out, &plaintext).await?;

        Ok(format!(
            "Decrypted {} with {} in {:.6}s -> {} ({} bytes)",
            response.original_encrypted_filename,
            response.algorithm,
            response.decryption_time,
            out.display(),
            response.decrypted_size
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(out: Option<&str>) -> Decrypt {
        Decrypt {
            path: PathBuf::from("report.pdf.enc"),
            out: out.map(PathBuf::from),
        }
    }

    #[test]
    fn test_reported_name_stays_in_current_dir() {
        assert_eq!(op(None).out_path("report.pdf"), PathBuf::from("report.pdf"));
        assert_eq!(op(None).out_path("../escaped.txt"), PathBuf::from("escaped.txt"));
        assert_eq!(op(None).out_path("/etc/cron.d/job"), PathBuf::from("job"));
        assert_eq!(op(None).out_path(".."), PathBuf::from(DEFAULT_FILENAME));
        assert_eq!(op(None).out_path(""), PathBuf::from(DEFAULT_FILENAME));
    }

    #[test]
    fn test_explicit_out_wins() {
        assert_eq!(
            op(Some("/tmp/plain.txt")).out_path("../escaped.txt"),
            PathBuf::from("/tmp/plain.txt")
        );
    }
}

use futures_util::TryStreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::info;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Streams remote sources to local disk so the sampler and prober only ever
/// see files.
#[derive(Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` into `dest_dir/source[.ext]` and returns the file path.
    pub async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, DownloadError> {
        let dest = dest_dir.join(local_file_name(url));
        info!("⬇️ Downloading {} to {}", url, dest.display());

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| DownloadError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let io_err = |source| DownloadError::Io {
            path: dest.clone(),
            source,
        };

        let mut body = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let mut file = BufWriter::new(File::create(&dest).await.map_err(io_err)?);
        let written = tokio::io::copy(&mut body, &mut file).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        info!("⬇️ Downloaded {} bytes", written);
        Ok(dest)
    }
}

/// Keeps the remote extension when it has one so ffmpeg can sniff the
/// container from the name too.
fn local_file_name(url: &str) -> String {
    let extension = url::Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .and_then(|last| {
                Path::new(&last)
                    .extension()
                    .map(|e| e.to_string_lossy().to_ascii_lowercase())
            })
            .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
    });

    match extension {
        Some(ext) => format!("source.{ext}"),
        None => "source".to_string(),
    }
}

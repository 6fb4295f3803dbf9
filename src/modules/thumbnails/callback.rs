use super::model::{CueFileInfo, Job, JobStatus, SpriteInfo};
use crate::config::settings::CallbackConfig;
use hmac::{Hmac, Mac};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to serialize callback body: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid signing key: {0}")]
    InvalidKey(#[from] hmac::digest::InvalidLength),
    #[error("callback request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("callback endpoint answered with HTTP {0}")]
    Rejected(u16),
}

/// What the caller receives once the job is terminal. Field order is fixed
/// by the struct, so the same outcome always serializes to the same bytes.
#[derive(Debug, Serialize)]
pub struct CallbackBody<'a> {
    pub job_id: Uuid,
    pub video_id: &'a str,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprites: Option<&'a [SpriteInfo]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtt: Option<&'a CueFileInfo>,
}

impl<'a> CallbackBody<'a> {
    /// `None` while the job is still queued or running.
    pub fn for_job(job: &'a Job) -> Option<Self> {
        if !job.state.is_terminal() {
            return None;
        }
        let result = job.result();
        Some(Self {
            job_id: job.id,
            video_id: &job.params.video_id,
            status: job.status(),
            error: job.error(),
            sprites: result.map(|r| r.sprites.as_slice()),
            vtt: result.map(|r| &r.vtt),
        })
    }
}

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, CallbackError> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Per-job token when the caller gave one, the process secret otherwise.
pub fn signing_secret<'a>(token: Option<&'a str>, config: &'a CallbackConfig) -> &'a [u8] {
    token
        .filter(|t| !t.is_empty())
        .unwrap_or(config.global_auth_token.as_str())
        .as_bytes()
}

#[derive(Clone)]
pub struct CallbackNotifier {
    client: Client,
}

impl CallbackNotifier {
    pub fn new(config: &CallbackConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }

    /// Fire-and-forget: delivery problems are logged, never returned. The
    /// job's recorded status is not touched either way.
    pub async fn notify(&self, job: &Job, config: &CallbackConfig) {
        let Some(url) = job.params.callback_url.as_deref() else {
            info!(job_id = %job.id, "📭 No callback_url, skipping callback");
            return;
        };
        let Some(body) = CallbackBody::for_job(job) else {
            warn!(job_id = %job.id, status = %job.status(), "Refusing to call back for a non-terminal job");
            return;
        };

        match self
            .deliver(url, job.params.auth_token.as_deref(), &body, config)
            .await
        {
            Ok(status) => info!(job_id = %job.id, status, "📨 Callback delivered to {}", url),
            Err(e) => warn!(job_id = %job.id, "❌ Callback to {} failed: {}", url, e),
        }
    }

    pub async fn deliver(
        &self,
        url: &str,
        token: Option<&str>,
        body: &CallbackBody<'_>,
        config: &CallbackConfig,
    ) -> Result<u16, CallbackError> {
        let raw = serde_json::to_vec(body)?;
        let signature = sign(signing_secret(token, config), &raw)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(raw)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::Rejected(status.as_u16()));
        }
        Ok(status.as_u16())
    }
}

use reqwest::{Client, Url};
use crate::domain::{ContactForm, SubmissionResult};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The relay answered with a failure envelope.
    #[error("{}", .0.message)]
    Rejected(SubmissionResult),
    #[error("Failed to reach the contact endpoint")]
    Transport(#[source] reqwest::Error),
    #[error("The contact endpoint answered {status} with an unreadable body")]
    InvalidResponse {
        status: u16,
        #[source]
        source: reqwest::Error,
    },
}

/// HTTP client for the contact relay.
///
/// Sends exactly one request per call and never retries, retrying is left to
/// the user.
pub struct ContactClient {
    http_client: Client,
    endpoint: Url,
}

impl ContactClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http_client: Client::new(),
            endpoint,
        }
    }

    /// Client for the relay served under `base_url`.
    pub fn for_base_url(base_url: &str) -> Result<Self, anyhow::Error> {
        let endpoint = Url::parse(base_url)?.join("/api/contact")?;
        Ok(Self::new(endpoint))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts the raw, untrimmed fields as JSON.
    #[tracing::instrument(name = "Post a contact submission", skip(self, form))]
    pub async fn post_submission(&self, form: &ContactForm) -> Result<SubmissionResult, ClientError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(form)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        let result: SubmissionResult = response
            .json()
            .await
            .map_err(|source| ClientError::InvalidResponse {
                status: status.as_u16(),
                source,
            })?;

        if status.is_success() && result.success {
            Ok(result)
        } else {
            Err(ClientError::Rejected(result))
        }
    }
}

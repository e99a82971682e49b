use super::{Transport, TransportResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use surf::Client;
use utils::surf_logging::SurfLogging;

/// [`Transport`] backed by surf, sending a pre-acquired bearer token.
#[derive(Clone)]
pub struct SurfTransport {
    http: Client,
    authorization: String,
}

impl SurfTransport {
    pub fn new(access_token: &str) -> Self {
        Self::with_client(Client::new().with(SurfLogging), access_token)
    }

    pub fn with_client(http: Client, access_token: &str) -> Self {
        Self {
            http,
            authorization: format!("Bearer {}", access_token),
        }
    }
}

#[async_trait]
impl Transport for SurfTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        let mut response = self
            .http
            .get(url)
            .header("Authorization", self.authorization.as_str())
            .await
            .map_err(Error::transport)?;

        let status = u16::from(response.status());
        let body = response.body_bytes().await.map_err(Error::transport)?;

        Ok(TransportResponse::new(status, body))
    }
}

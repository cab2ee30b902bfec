//! Query execution: the seam between the endpoint registry and HTTP

use std::sync::Arc;

use async_trait::async_trait;
use reel_auth::AuthSession;
use reel_config::ApiSettings;
use reel_core::error::{NormalizedError, ReelResult};
use reel_core::types::RequestDescriptor;
use tracing::warn;

use crate::normalize::ErrorNormalizer;
use crate::transport::{HttpTransport, RawResponse};

/// Executes one request descriptor and reports failures as [`NormalizedError`]
#[async_trait]
pub trait BaseQuery: Send + Sync {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, NormalizedError>;
}

#[async_trait]
impl<T: BaseQuery + ?Sized> BaseQuery for Arc<T> {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, NormalizedError> {
        (**self).execute(request).await
    }
}

/// [`BaseQuery`] over the HTTP transport, with an optional session for bearer tokens
#[derive(Clone)]
pub struct HttpBaseQuery {
    transport: HttpTransport,
    normalizer: ErrorNormalizer,
    session: Option<Arc<dyn AuthSession>>,
}

impl std::fmt::Debug for HttpBaseQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBaseQuery")
            .field("transport", &self.transport)
            .field("normalizer", &self.normalizer)
            .field("session", &self.session.is_some())
            .finish()
    }
}

impl HttpBaseQuery {
    pub fn new(transport: HttpTransport, normalizer: ErrorNormalizer) -> Self {
        Self {
            transport,
            normalizer,
            session: None,
        }
    }

    /// Transport and normalizer built from the API settings
    pub fn from_settings(settings: &ApiSettings) -> ReelResult<Self> {
        Ok(Self::new(
            HttpTransport::from_settings(settings)?,
            ErrorNormalizer::from_settings(settings),
        ))
    }

    /// Attach the session that supplies bearer tokens
    pub fn with_session(mut self, session: Arc<dyn AuthSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[async_trait]
impl BaseQuery for HttpBaseQuery {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, NormalizedError> {
        let token = match &self.session {
            Some(session) => session.get_token().await,
            None => None,
        };

        match self.transport.send(&request, token.as_deref()).await {
            Ok(response) => Ok(response),
            Err(error) => {
                warn!("{} {} failed: {}", request.method, request.url, error);
                Err(self.normalizer.normalize(&error))
            }
        }
    }
}

#[cfg(test)]
mod tests;

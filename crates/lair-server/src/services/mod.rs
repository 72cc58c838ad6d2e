//! External collaborators.
//!
//! Every slow or fallible operation a page can request sits behind a narrow
//! async trait. [`Services`] maps a [`Request`] to exactly one [`Response`],
//! turning failures into error payloads the requesting page renders.

mod documents;
mod mail;
mod weather;

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use lair_app::{ContactMessage, Request, Response};
use thiserror::Error;
use tracing::warn;

pub use documents::FileDocuments;
pub use mail::{HttpMailer, LogMailer};
pub use weather::WttrWeather;

/// Errors from collaborators.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP request failed or returned an error status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local I/O failed.
    #[error("{path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// No document is registered under this name.
    #[error("unknown document: {0}")]
    UnknownDocument(String),
}

/// Current weather lookup.
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// One-line weather summary.
    async fn current(&self) -> Result<String, ServiceError>;
}

/// Outbound mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a contact message.
    async fn send(&self, message: &ContactMessage) -> Result<(), ServiceError>;
}

/// Named documents.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Text of the document called `name`.
    async fn load(&self, name: &str) -> Result<String, ServiceError>;
}

/// Collaborator configuration.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    /// Location passed to the weather service.
    pub weather_location: String,
    /// Weather request timeout.
    pub weather_timeout: Duration,
    /// Mail relay endpoint. `None` logs messages instead of sending them.
    pub mail_endpoint: Option<String>,
    /// Document name → file path.
    pub documents: HashMap<String, PathBuf>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            weather_location: "pretoria".to_string(),
            weather_timeout: Duration::from_secs(11),
            mail_endpoint: None,
            documents: HashMap::from([("about".to_string(), PathBuf::from("about.md"))]),
        }
    }
}

/// Shared collaborator set. Clone is cheap (Arc).
#[derive(Clone)]
pub struct Services {
    weather: Arc<dyn WeatherClient>,
    mailer: Arc<dyn Mailer>,
    documents: Arc<dyn DocumentSource>,
}

impl Services {
    /// Bundle collaborators.
    pub fn new(
        weather: Arc<dyn WeatherClient>,
        mailer: Arc<dyn Mailer>,
        documents: Arc<dyn DocumentSource>,
    ) -> Self {
        Self { weather, mailer, documents }
    }

    /// Production collaborators built from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: ServicesConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(config.weather_timeout).build()?;

        let mailer: Arc<dyn Mailer> = match config.mail_endpoint {
            Some(endpoint) => Arc::new(HttpMailer::new(client.clone(), endpoint)),
            None => Arc::new(LogMailer),
        };

        Ok(Self::new(
            Arc::new(WttrWeather::new(client, config.weather_location)),
            mailer,
            Arc::new(FileDocuments::new(config.documents)),
        ))
    }

    /// Run `request` to completion.
    pub async fn fulfil(&self, request: Request) -> Response {
        match request {
            Request::Weather => Response::Weather(self.weather.current().await.map_err(report)),
            Request::Document { name } => {
                let result = self.documents.load(&name).await.map_err(report);
                Response::Document { name, result }
            },
            Request::SendMessage(message) => {
                Response::MessageSent(self.mailer.send(&message).await.map_err(report))
            },
        }
    }
}

fn report(err: ServiceError) -> String {
    warn!(error = %err, "request failed");
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sunny;

    #[async_trait]
    impl WeatherClient for Sunny {
        async fn current(&self) -> Result<String, ServiceError> {
            Ok("Pretoria: ☀️ +24°C".into())
        }
    }

    struct Missing;

    #[async_trait]
    impl DocumentSource for Missing {
        async fn load(&self, name: &str) -> Result<String, ServiceError> {
            Err(ServiceError::UnknownDocument(name.to_string()))
        }
    }

    fn services() -> Services {
        Services::new(Arc::new(Sunny), Arc::new(LogMailer), Arc::new(Missing))
    }

    #[tokio::test]
    async fn fulfil_maps_success() {
        let response = services().fulfil(Request::Weather).await;
        assert_eq!(response, Response::Weather(Ok("Pretoria: ☀️ +24°C".into())));

        let message = ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "hello".into(),
        };
        let response = services().fulfil(Request::SendMessage(message)).await;
        assert_eq!(response, Response::MessageSent(Ok(())));
    }

    #[tokio::test]
    async fn fulfil_turns_errors_into_payloads() {
        let response = services().fulfil(Request::Document { name: "cv".into() }).await;
        assert_eq!(response, Response::Document {
            name: "cv".into(),
            result: Err("unknown document: cv".into()),
        });
    }
}

//! Analysis by an external model over HTTP
//!
//! The request body is forwarded as JSON with a bearer token; the service must
//! answer `{key, bpm, energy, confidence}`.

use super::{AnalysisRequest, Analyzer, RawAnalysis};
use async_trait::async_trait;
use muzo_common::config::AnalysisConfig;
use muzo_common::{Error, Result};
use std::time::Duration;
use tracing::debug;

pub struct RemoteAnalyzer {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl RemoteAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("muzo-lm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone().filter(|s| !s.trim().is_empty()),
            api_key: config.api_key.clone().filter(|s| !s.trim().is_empty()),
        })
    }

    /// Both endpoint and API key are set
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

#[async_trait]
impl Analyzer for RemoteAnalyzer {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis> {
        let (Some(endpoint), Some(api_key)) = (&self.endpoint, &self.api_key) else {
            return Err(Error::Analysis(
                "Remote analysis is not configured (endpoint and API key required)".to_string(),
            ));
        };

        debug!(endpoint = %endpoint, filename = %request.filename, "Requesting remote analysis");

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Analysis(format!("Analysis service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Analysis(format!(
                "Analysis service returned {}",
                status
            )));
        }

        response
            .json::<RawAnalysis>()
            .await
            .map_err(|e| Error::Analysis(format!("Malformed analysis response: {}", e)))
    }
}

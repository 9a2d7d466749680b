//! Status polling for individual devices.
//!
//! Every fetch is bounded by its own timeout and never fails towards the
//! caller: unreachable hosts, non-200 answers, malformed JSON, and timeouts
//! all collapse into `StatusResult::Offline`. One dead device can therefore
//! never hold up or break the reporting of the others.

use crate::error::PollError;
use crate::models::{status_url, Device, StatusReading, StatusResult, StatusSample};
use async_trait::async_trait;
use chrono::Local;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);

/// Source of device status, HTTP in production, scripted in tests
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, device: &Device) -> StatusResult;

    /// Best-effort reachability check used before registering a device
    async fn probe(&self, address: &str, port: u16) -> bool;
}

#[derive(Clone)]
pub struct HttpStatusPoller {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpStatusPoller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, PollError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PollError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    /// The whole exchange (connect, headers, body) shares one deadline;
    /// dropping the future on expiry cancels the request.
    async fn bounded<T, F>(&self, exchange: F) -> Result<T, PollError>
    where
        F: Future<Output = Result<T, PollError>>,
    {
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| PollError::Timeout)?
    }

    async fn read_status(&self, url: &str) -> Result<StatusReading, PollError> {
        self.bounded(async {
            let response = self.get(url).await?;
            Ok::<_, PollError>(response.json::<StatusReading>().await?)
        })
        .await
    }
}

impl Default for HttpStatusPoller {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl StatusSource for HttpStatusPoller {
    async fn fetch_status(&self, device: &Device) -> StatusResult {
        match self.read_status(&device.status_url()).await {
            Ok(reading) => StatusResult::Online(StatusSample::from_reading(&reading, Local::now())),
            Err(e) => {
                debug!("Device {} ({}) unavailable: {}", device.name, device.endpoint(), e);
                StatusResult::unavailable()
            }
        }
    }

    async fn probe(&self, address: &str, port: u16) -> bool {
        let url = status_url(address, port);
        match self.bounded(self.get(&url)).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Probe of {}:{} failed: {}", address, port, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn device_for(server: &MockServer) -> Device {
        let addr: &SocketAddr = server.address();
        Device::new("Test Pi", addr.ip().to_string(), addr.port())
    }

    #[tokio::test]
    async fn test_fetch_status_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "temperature": 52.1, "speed": 35, "cpu": 61.0, "memory": 40.5
            })))
            .mount(&server)
            .await;

        let result = HttpStatusPoller::default().fetch_status(&device_for(&server)).await;
        let sample = result.sample().expect("device should be online");
        assert_eq!(sample.temperature, 52.1);
        assert_eq!(sample.fan_speed_percent, 35);
        assert_eq!(sample.cpu_percent, 61.0);
        assert_eq!(sample.memory_percent, 40.5);
    }

    #[tokio::test]
    async fn test_non_success_status_is_offline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let poller = HttpStatusPoller::default();
        let device = device_for(&server);
        assert_eq!(poller.fetch_status(&device).await, StatusResult::unavailable());
        assert!(!poller.probe(&device.address, device.port).await);
    }

    #[tokio::test]
    async fn test_malformed_body_is_offline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fan: on"))
            .mount(&server)
            .await;

        let poller = HttpStatusPoller::default();
        let device = device_for(&server);
        assert_eq!(poller.fetch_status(&device).await, StatusResult::unavailable());
        // la sonde ne regarde que le code HTTP
        assert!(poller.probe(&device.address, device.port).await);
    }

    #[tokio::test]
    async fn test_slow_device_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"temperature": 1, "speed": 1, "cpu": 1, "memory": 1}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let poller = HttpStatusPoller::new(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let result = poller.fetch_status(&device_for(&server)).await;
        assert_eq!(result, StatusResult::unavailable());
        assert!(started.elapsed() < Duration::from_millis(450));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_offline() {
        // port fermé sur la boucle locale
        let device = Device::new("Ghost", "127.0.0.1", 1);
        let result = HttpStatusPoller::new(Duration::from_millis(300)).fetch_status(&device).await;
        assert_eq!(result, StatusResult::unavailable());
    }
}

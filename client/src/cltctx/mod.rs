use anyhow::{anyhow, Result};
use commons::env::{self, EnvLookup, ProcessEnv};
use commons::rpc::pingpong::ping_service_client::PingServiceClient;
use commons::rpc::pingpong::{PayloadRequest, PayloadResponse, PingRequest, PingResponse};
use commons::rpc::GrpcConfig;
use commons::utils::PayloadUtility;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};

mod stats;
pub use stats::LatencyStats;

const MAX_TIMEOUT: Duration = Duration::from_secs(GrpcConfig::MAX_TIMEOUT_SECS as u64);
const DEADLINE_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_addr: String,
    pub keepalive_time: Duration,
    pub keepalive_timeout: Duration,
    pub permit_without_stream: bool,
    pub ping_interval: Duration,
    pub use_payload: bool,
    pub payload_size_kb: f64,
    pub request_timeout: Duration,
    /// Number of calls to make; 0 runs until interrupted.
    pub ping_count: u64,
}

fn secs(value: i64) -> Duration {
    Duration::from_secs(value.max(0) as u64)
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup<L: EnvLookup + ?Sized>(source: &L) -> Self {
        Self {
            server_addr: env::string_from(source, "SERVER_ADDR", GrpcConfig::DEFAULT_SERVER_ADDR),
            keepalive_time: secs(env::int_from(source, "KEEPALIVE_TIME_SEC", 10)),
            keepalive_timeout: secs(env::int_from(source, "KEEPALIVE_TIMEOUT_SEC", 2)),
            permit_without_stream: env::bool_from(source, "PERMIT_WITHOUT_STREAM", false),
            ping_interval: secs(env::int_from(source, "PING_INTERVAL_SEC", 2)),
            use_payload: env::bool_from(source, "USE_PAYLOAD", false),
            payload_size_kb: env::size_kb_from(
                source,
                "PAYLOAD_SIZE_KB",
                PayloadUtility::DEFAULT_SIZE_KB,
            ),
            request_timeout: secs(env::int_bounded_from(
                source,
                "REQUEST_TIMEOUT_SEC",
                100,
                0,
                GrpcConfig::MAX_TIMEOUT_SECS,
            )),
            ping_count: env::int_from(source, "PING_COUNT", 0).max(0) as u64,
        }
    }

    pub fn log_config(&self) {
        info!(
            "Client connecting to {} with keepalive params: time={}s, timeout={}s, permitWithoutStream={}",
            self.server_addr,
            self.keepalive_time.as_secs(),
            self.keepalive_timeout.as_secs(),
            self.permit_without_stream
        );
        if self.use_payload {
            info!("Using payload mode with size: {:.2} KB", self.payload_size_kb);
        }
    }
}

pub struct ClientContext {
    config: ClientConfig,
    client: PingServiceClient<Channel>,
    stats: LatencyStats,
}

impl ClientContext {
    /// Builds the channel. The connection itself is made lazily on first use,
    /// so only a malformed address fails here.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let target = GrpcConfig::normalize_endpoint(&config.server_addr);
        let mut endpoint = Endpoint::from_shared(target.clone())
            .map_err(|e| anyhow!("did not connect to {}: {}", target, e))?
            .keep_alive_while_idle(config.permit_without_stream);
        if !config.keepalive_time.is_zero() {
            endpoint = endpoint
                .http2_keep_alive_interval(config.keepalive_time)
                .keep_alive_timeout(config.keepalive_timeout);
        }

        let channel = endpoint.connect_lazy();
        let client = PingServiceClient::new(channel)
            .max_decoding_message_size(GrpcConfig::message_limit(config.payload_size_kb));

        debug!("Channel to {} created", target);

        Ok(Self {
            config,
            client,
            stats: LatencyStats::new(),
        })
    }

    pub fn stats(&self) -> &LatencyStats {
        &self.stats
    }

    fn with_deadline<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.config.request_timeout.min(MAX_TIMEOUT));
        request
    }

    /// Runs `call` under the request deadline. The local timer trails the
    /// server's by `DEADLINE_GRACE`, and a server that cancels once the
    /// deadline has passed is reported as `DeadlineExceeded` too.
    async fn deadline<T, F>(&self, call: F) -> Result<T, Status>
    where
        F: Future<Output = Result<tonic::Response<T>, Status>>,
    {
        let timeout = self.config.request_timeout;
        let start_time = Instant::now();
        match tokio::time::timeout(timeout.saturating_add(DEADLINE_GRACE), call).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status))
                if status.code() == Code::Cancelled && start_time.elapsed() >= timeout =>
            {
                Err(Status::deadline_exceeded(format!(
                    "request timed out: {}",
                    status.message()
                )))
            }
            Ok(Err(status)) => Err(status),
            Err(_) => Err(Status::deadline_exceeded("request timed out")),
        }
    }

    pub async fn request_ping(&self) -> Result<PingResponse, Status> {
        let request = self.with_deadline(PingRequest {
            message: "Hello".to_string(),
        });
        let mut client = self.client.clone();
        self.deadline(client.ping(request)).await
    }

    pub async fn request_payload(&self) -> Result<PayloadResponse, Status> {
        let size_kb = self.config.payload_size_kb;
        let request = self.with_deadline(PayloadRequest {
            message: format!("Request {:.2}KB payload", size_kb),
            size_kb: size_kb as f32,
        });
        let mut client = self.client.clone();
        self.deadline(client.ping_with_payload(request)).await
    }

    /// Pings once, logging and counting the outcome.
    pub async fn send_ping(&mut self) {
        let start_time = Instant::now();
        let result = self.request_ping().await;
        let round_trip = start_time.elapsed().as_millis();

        match result {
            Ok(resp) => {
                self.stats.record_success(round_trip);
                info!(
                    "Response: {} (timestamp: {}, server delay: {}ms, round-trip: {}ms)",
                    resp.message, resp.timestamp, resp.delay_ms, round_trip
                );
            }
            Err(status) => {
                self.stats.record_failure();
                warn!("could not ping: {}", status);
            }
        }
    }

    /// Requests one payload, logging and counting the outcome.
    pub async fn send_payload(&mut self) {
        let start_time = Instant::now();
        let result = self.request_payload().await;
        let round_trip = start_time.elapsed().as_millis();

        match result {
            Ok(resp) => {
                self.stats.record_success(round_trip);
                info!(
                    "Payload Response: {} (size: {:.2}KB, server delay: {}ms, round-trip: {}ms)",
                    resp.message, resp.size_kb, resp.delay_ms, round_trip
                );
            }
            Err(status) => {
                self.stats.record_failure();
                warn!("could not request payload: {}", status);
            }
        }
    }

    async fn send_once(&mut self) {
        if self.config.use_payload {
            self.send_payload().await;
        } else {
            self.send_ping().await;
        }
    }

    /// Calls the server every `ping_interval` until `ping_count` calls are
    /// made or `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> &LatencyStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let limit = self.config.ping_count;
        let interval = self.config.ping_interval;
        let mut sent: u64 = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.send_once() => {}
            }
            sent += 1;
            if limit > 0 && sent >= limit {
                break;
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        debug!("Client stopped after {} call(s)", sent);
        &self.stats
    }
}

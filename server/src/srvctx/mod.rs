use anyhow::{anyhow, Result};
use commons::delay::DelayRange;
use commons::env::{self, EnvLookup, ProcessEnv};
use commons::rpc::pingpong::ping_service_server::PingServiceServer;
use commons::rpc::GrpcConfig;
use commons::utils::PayloadUtility;
use log::{debug, info};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tonic::transport::Server;

mod reqhandler;
use reqhandler::PingHandler;

/// Server-side HTTP/2 keepalive and connection lifetime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct KeepaliveParams {
    pub max_connection_idle: Duration,
    pub max_connection_age: Duration,
    pub max_connection_age_grace: Duration,
    pub time: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: String,
    pub keepalive: KeepaliveParams,
    pub max_payload_kb: f64,
    pub response_delay: DelayRange,
}

fn secs(value: i64) -> Duration {
    Duration::from_secs(value.max(0) as u64)
}

// zero disables the timer
fn non_zero(d: Duration) -> Option<Duration> {
    if d.is_zero() {
        None
    } else {
        Some(d)
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup<L: EnvLookup + ?Sized>(source: &L) -> Self {
        let default_port = GrpcConfig::DEFAULT_PORT.to_string();
        Self {
            port: env::string_from(source, "SERVER_PORT", &default_port),
            keepalive: KeepaliveParams {
                max_connection_idle: secs(env::int_from(source, "MAX_CONN_IDLE_SEC", 15)),
                max_connection_age: secs(env::int_from(source, "MAX_CONN_AGE_SEC", 30)),
                max_connection_age_grace: secs(env::int_from(
                    source,
                    "MAX_CONN_AGE_GRACE_SEC",
                    5,
                )),
                time: secs(env::int_from(source, "KEEPALIVE_TIME_SEC", 5)),
                timeout: secs(env::int_from(source, "KEEPALIVE_TIMEOUT_SEC", 1)),
            },
            max_payload_kb: env::size_kb_from(
                source,
                "MAX_PAYLOAD_SIZE_KB",
                PayloadUtility::DEFAULT_MAX_SIZE_KB,
            ),
            response_delay: env::delay_from(source, "RESPONSE_DELAY_MS", DelayRange::DEFAULT),
        }
    }

    /// Dual-stack wildcard first, IPv4 wildcard for hosts without IPv6.
    pub fn bind_addrs(&self) -> Result<[SocketAddr; 2]> {
        let parse = |addr: String| {
            addr.parse::<SocketAddr>()
                .map_err(|e| anyhow!("Invalid listen address {}: {}", addr, e))
        };
        Ok([
            parse(format!("[::]:{}", self.port))?,
            parse(format!("0.0.0.0:{}", self.port))?,
        ])
    }
}

pub struct ServerContext {
    config: ServerConfig,
    hostname: String,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let hostname = hostname::get()?
            .into_string()
            .map_err(|_| anyhow!("Invalid hostname"))?;
        Ok(Self { config, hostname })
    }

    pub fn log_config(&self) {
        let ka = &self.config.keepalive;
        info!(
            "Server starting with keepalive params: idle={}s, age={}s, grace={}s, time={}s, timeout={}s",
            ka.max_connection_idle.as_secs(),
            ka.max_connection_age.as_secs(),
            ka.max_connection_age_grace.as_secs(),
            ka.time.as_secs(),
            ka.timeout.as_secs()
        );
        info!(
            "Performance config: max_payload={:.2}KB, delay_range={}",
            self.config.max_payload_kb, self.config.response_delay
        );
        // tonic exposes no idle or grace timers; these values are informational
        debug!(
            "max_connection_idle and max_connection_age_grace are not enforced by the transport"
        );
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let [dual_stack, ipv4] = self.config.bind_addrs()?;
        match TcpListener::bind(dual_stack).await {
            Ok(listener) => Ok(listener),
            Err(e) => {
                debug!("Could not listen on {}: {}, trying {}", dual_stack, e, ipv4);
                TcpListener::bind(ipv4)
                    .await
                    .map_err(|e| anyhow!("failed to listen on {}: {}", ipv4, e))
            }
        }
    }

    /// Serves `PingService` on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        let handler = PingHandler::new(self.config.response_delay, self.config.max_payload_kb);
        let service = PingServiceServer::new(handler)
            .max_encoding_message_size(GrpcConfig::message_limit(self.config.max_payload_kb));

        let ka = &self.config.keepalive;
        let mut builder = Server::builder()
            .http2_keepalive_interval(non_zero(ka.time))
            .http2_keepalive_timeout(non_zero(ka.timeout));
        if let Some(age) = non_zero(ka.max_connection_age) {
            builder = builder.max_connection_age(age);
        }

        info!("Server listening at {} ({})", local_addr, self.hostname);

        builder
            .add_service(service)
            .serve_with_incoming_shutdown(
                tokio_stream::wrappers::TcpListenerStream::new(listener),
                shutdown,
            )
            .await
            .map_err(|e| anyhow!("failed to serve: {}", e))?;

        info!("Server at {} shut down", local_addr);
        Ok(())
    }
}

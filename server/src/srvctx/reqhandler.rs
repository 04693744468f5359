use async_trait::async_trait;
use commons::delay::DelayRange;
use commons::rpc::pingpong::ping_service_server::PingService;
use commons::rpc::pingpong::{PayloadRequest, PayloadResponse, PingRequest, PingResponse};
use commons::utils::{PayloadUtility, TimeUtility};
use log::info;
use std::time::Duration;
use tonic::{Request, Response, Status};

/// Answers pings after a delay drawn from `delay`.
#[derive(Debug, Clone)]
pub struct PingHandler {
    delay: DelayRange,
    max_payload_kb: f64,
}

impl PingHandler {
    pub fn new(delay: DelayRange, max_payload_kb: f64) -> Self {
        Self {
            delay,
            max_payload_kb,
        }
    }

    fn pick_delay(&self) -> u64 {
        self.delay.sample(&mut rand::rng())
    }
}

fn delay_field(delay_ms: u64) -> i32 {
    i32::try_from(delay_ms).unwrap_or(i32::MAX)
}

#[async_trait]
impl PingService for PingHandler {
    async fn ping(&self, request: Request<PingRequest>) -> Result<Response<PingResponse>, Status> {
        let request = request.into_inner();
        let delay_ms = self.pick_delay();

        info!("Received ping: {} (delaying {}ms)", request.message, delay_ms);

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        Ok(Response::new(PingResponse {
            message: format!("Pong: {}", request.message),
            timestamp: TimeUtility::get_timestamp_s(),
            delay_ms: delay_field(delay_ms),
        }))
    }

    async fn ping_with_payload(
        &self,
        request: Request<PayloadRequest>,
    ) -> Result<Response<PayloadResponse>, Status> {
        let request = request.into_inner();
        let delay_ms = self.pick_delay();

        let requested_kb = request.size_kb as f64;
        let (size_kb, capped) =
            PayloadUtility::effective_size_kb(requested_kb, self.max_payload_kb);
        if capped {
            info!(
                "Requested payload size {:.2}KB exceeds maximum {:.2}KB, capping",
                requested_kb, self.max_payload_kb
            );
        }

        info!(
            "Received payload request: {}, size: {:.2}KB (delaying {}ms)",
            request.message, size_kb, delay_ms
        );

        let payload =
            PayloadUtility::random_payload(PayloadUtility::size_in_bytes(size_kb), &mut rand::rng());

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        Ok(Response::new(PayloadResponse {
            message: format!("Payload response: {}", request.message),
            timestamp: TimeUtility::get_timestamp_s(),
            size_kb: size_kb as f32,
            delay_ms: delay_field(delay_ms),
            payload,
        }))
    }
}

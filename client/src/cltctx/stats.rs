use log::info;

/// Round-trip accounting across the calls of one client run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub total_latency_ms: u128,
    pub min_latency_ms: Option<u128>,
    pub max_latency_ms: u128,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, latency_ms: u128) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.total_latency_ms += latency_ms;
        self.min_latency_ms = Some(
            self.min_latency_ms
                .map_or(latency_ms, |min| min.min(latency_ms)),
        );
        self.max_latency_ms = self.max_latency_ms.max(latency_ms);
    }

    pub fn record_failure(&mut self) {
        self.total_requests += 1;
        self.failed_requests += 1;
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.successful_requests == 0 {
            return 0.0;
        }
        self.total_latency_ms as f64 / self.successful_requests as f64
    }

    pub fn print_stats(&self) {
        info!(
            "total={} success={} failed={} min={}ms max={}ms avg={:.2}ms",
            self.total_requests,
            self.successful_requests,
            self.failed_requests,
            self.min_latency_ms.unwrap_or(0),
            self.max_latency_ms,
            self.avg_latency_ms()
        );
    }
}

// Include the generated protobuf code
pub mod pingpong {
    tonic::include_proto!("pingpong");
}

/// gRPC transport settings shared by client and server.
pub struct GrpcConfig {}

impl GrpcConfig {
    pub const DEFAULT_PORT: u16 = 50051;
    pub const DEFAULT_SERVER_ADDR: &'static str = "localhost:50051";

    /// Largest deadline tonic can encode in a `grpc-timeout` header
    /// (99,999,999 hours).
    pub const MAX_TIMEOUT_SECS: i64 = 99_999_999 * 3600;

    /// tonic's default message size limit.
    pub const DEFAULT_MESSAGE_LIMIT: usize = 4 * 1024 * 1024;
    /// Room for the non-payload fields and protobuf framing.
    pub const ENVELOPE_ALLOWANCE: usize = 64 * 1024;

    /// The encode/decode limit needed to carry a payload of `size_kb`.
    pub fn message_limit(size_kb: f64) -> usize {
        let payload = crate::utils::PayloadUtility::size_in_bytes(size_kb);
        payload
            .saturating_add(Self::ENVELOPE_ALLOWANCE)
            .max(Self::DEFAULT_MESSAGE_LIMIT)
    }

    pub fn normalize_endpoint(addr: &str) -> String {
        if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        }
    }
}

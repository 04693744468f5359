pub mod delay;
pub mod env;
pub mod err;
pub mod rpc;
pub mod utils;

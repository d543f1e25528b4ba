//! [`RemoteClient`](taskdesk_core::RemoteClient) implementations.

pub mod http;
pub mod memory;

pub use http::HttpRecordClient;
pub use memory::{Fault, MemoryRecordClient};

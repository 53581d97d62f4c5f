//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_linc_admin_client;

pub use http_linc_admin_client::{HttpLincAdminClient, LincApiClientConfig};

pub mod http;
pub mod http_client;
pub mod reliable;
pub mod traits;

pub use http::HttpTransport;
pub use http_client::build_transport_client;
pub use reliable::{ReliableTransport, RetryPolicy};
pub use traits::ChatTransport;

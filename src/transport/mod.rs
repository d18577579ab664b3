pub mod headers;
pub mod http_client;
pub mod media_client;

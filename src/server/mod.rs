mod handlers;
mod http;
#[cfg(test)]
mod tests;

pub use handlers::HealthResponse;
pub use http::{HttpServer, HttpServerBuilder};

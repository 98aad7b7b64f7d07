pub mod gemini;
mod gemini_types;
pub mod http_client;
pub mod reliable;
pub mod scrub;

pub use gemini::{GeminiClient, build_request, extract_text};
pub use gemini_types::GenerateContentRequest;
pub use http_client::{build_service_client, build_service_client_with_connect_timeout};
pub use reliable::{
    GenerateTransport, RawResponse, ReliableClient, RetryPolicy, TransportFailure,
};
pub use scrub::{sanitize_api_error, scrub_secret_patterns};

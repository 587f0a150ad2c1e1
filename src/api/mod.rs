//! Document API client.

mod client;
mod document;
mod transport;

pub use client::CrptApi;
pub use document::CreateDocumentRequest;
pub use transport::{DocumentTransport, HttpTransport, TransportResponse};

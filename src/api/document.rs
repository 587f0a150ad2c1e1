//! Request body for document creation.

use serde::Serialize;

/// JSON body posted to the document creation endpoint.
#[derive(Debug, Serialize)]
pub struct CreateDocumentRequest<'a, D: Serialize> {
    /// The document, serialized as-is
    pub document: &'a D,
    /// Detached signature of the document
    pub signature: &'a str,
}

impl<'a, D: Serialize> CreateDocumentRequest<'a, D> {
    pub fn new(document: &'a D, signature: &'a str) -> Self {
        Self {
            document,
            signature,
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

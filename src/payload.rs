//! Construction of the document submitted to the vectorization API.

use serde::Serialize;
use time::OffsetDateTime;

use crate::catalog::CatalogRecord;
use crate::extraction::ExtractedText;
use crate::storage::StorageObject;

/// Namespace routing tag attached to every submission.
pub const ROUTING_NAMESPACE: &str = "*";
/// Flow routing tag attached to every submission.
pub const ROUTING_FLOW: &str = "@";

const CONTENT_DELIMITER: &str = "=== CONTENIDO DEL DOCUMENTO ===";

/// Self-describing record sent to the vectorization API for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    /// Original file name in storage.
    pub name: String,
    /// Storage object identifier.
    pub id: String,
    /// Catalog title.
    pub title: String,
    /// Metadata header followed by the extracted or placeholder text.
    pub content: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Object creation timestamp, or the processing time when storage reported none.
    pub created_at: String,
    /// Namespace routing tag.
    pub namespace: &'static str,
    /// Flow routing tag.
    pub flow: &'static str,
}

/// Inputs for one payload; everything has already been fetched.
#[derive(Debug, Clone, Copy)]
pub struct PayloadInputs<'a> {
    /// Storage object being submitted.
    pub object: &'a StorageObject,
    /// Catalog record resolved for the object.
    pub record: &'a CatalogRecord,
    /// Extracted or placeholder text.
    pub extracted: &'a ExtractedText,
    /// Public URL of the object in storage.
    pub public_url: &'a str,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// RFC 3339 processing timestamp.
    pub processed_at: &'a str,
}

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    text: RequestDocument<'a>,
    namespace: &'a str,
    flow: &'a str,
}

#[derive(Serialize)]
struct RequestDocument<'a> {
    name: &'a str,
    id: &'a str,
    title: &'a str,
    content: &'a str,
    size: u64,
    created: &'a str,
}

impl SubmissionPayload {
    /// JSON body expected by the vectorization endpoint.
    pub fn request_body(&self) -> serde_json::Value {
        let envelope = RequestEnvelope {
            text: RequestDocument {
                name: &self.name,
                id: &self.id,
                title: &self.title,
                content: &self.content,
                size: self.size_bytes,
                created: &self.created_at,
            },
            namespace: self.namespace,
            flow: self.flow,
        };
        serde_json::to_value(envelope).unwrap_or_default()
    }
}

/// Render the human-readable content body.
pub fn build_content(inputs: &PayloadInputs<'_>) -> String {
    format!(
        "Título: {title}\n\
         Archivo: {name}\n\
         URL IADB: {source_url}\n\
         URL Storage: {public_url}\n\
         Tamaño: {size} bytes\n\
         Fecha de procesamiento: {processed_at}\n\
         \n\
         {CONTENT_DELIMITER}\n\
         \n\
         {text}",
        title = inputs.record.title,
        name = inputs.object.name,
        source_url = inputs.record.source_url,
        public_url = inputs.public_url,
        size = inputs.size_bytes,
        processed_at = inputs.processed_at,
        text = inputs.extracted.content,
    )
}

/// Build the payload for one document. Pure: no clocks, no I/O.
pub fn build_payload(inputs: &PayloadInputs<'_>) -> SubmissionPayload {
    SubmissionPayload {
        name: inputs.object.name.clone(),
        id: inputs.object.id.clone(),
        title: inputs.record.title.clone(),
        content: build_content(inputs),
        size_bytes: inputs.size_bytes,
        created_at: inputs
            .object
            .created_at
            .clone()
            .unwrap_or_else(|| inputs.processed_at.to_string()),
        namespace: ROUTING_NAMESPACE,
        flow: ROUTING_FLOW,
    }
}

/// Current timestamp formatted as RFC 3339.
pub fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

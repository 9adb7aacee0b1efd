use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;

/// The caller's structured state: an arbitrarily nested JSON object.
///
/// The backend never looks inside a document. It is stored, returned, or
/// replaced by an [`EncryptedState`] as a whole.
pub type Document = Map<String, Value>;

/// Free-form annotations stored next to a document.
pub type Metadata = Map<String, Value>;

/// Parse a request body into a [`Document`].
///
/// Anything other than a JSON object (including an empty body) is rejected.
pub fn document_from_slice(bytes: &[u8]) -> Result<Document, TypeError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TypeError::NotAnObject),
        Err(e) => Err(TypeError::Serialization(e.to_string())),
    }
}

/// At-rest envelope substituted for a document's content when encrypted.
///
/// Serializes as `{"encrypted_data": "<base64>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedState {
    /// Base64 (standard alphabet) encoding of the cipher output.
    pub encrypted_data: String,
}

impl EncryptedState {
    pub fn new(encrypted_data: impl Into<String>) -> Self {
        Self {
            encrypted_data: encrypted_data.into(),
        }
    }

    /// Read an envelope back out of a stored document.
    pub fn from_document(document: &Document) -> Result<Self, TypeError> {
        match document.get("encrypted_data") {
            Some(Value::String(data)) => Ok(Self::new(data.clone())),
            Some(_) => Err(TypeError::InvalidEnvelope(
                "encrypted_data is not a string".into(),
            )),
            None => Err(TypeError::InvalidEnvelope(
                "missing encrypted_data".into(),
            )),
        }
    }

    /// The envelope as a document, ready to hand to a store.
    pub fn into_document(self) -> Document {
        let mut document = Map::new();
        document.insert("encrypted_data".into(), Value::String(self.encrypted_data));
        document
    }
}

/// One row of the state collection, keyed uniquely by `ref`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    #[serde(rename = "ref")]
    pub reference: String,
    pub encrypted: bool,
    pub state: Document,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl StateRow {
    pub fn new(
        reference: impl Into<String>,
        state: Document,
        metadata: Option<Metadata>,
        encrypted: bool,
    ) -> Self {
        Self {
            reference: reference.into(),
            encrypted,
            state,
            metadata,
        }
    }
}

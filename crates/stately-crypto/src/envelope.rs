use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use stately_types::{Document, EncryptedState};

use crate::cipher::StateCipher;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Seal a document into an envelope.
///
/// The document is serialized as JSON, encrypted, and base64-encoded into
/// the envelope's single field.
pub fn encrypt(document: &Document, key_material: &[u8]) -> EnvelopeResult<EncryptedState> {
    let cipher = StateCipher::new(key_material)?;
    let plaintext = serde_json::to_vec(document)
        .map_err(|e| EnvelopeError::Cipher(format!("serialize state: {e}")))?;
    let sealed = cipher.seal(&plaintext)?;
    Ok(EncryptedState::new(STANDARD.encode(sealed)))
}

/// Open an envelope back into the original document.
pub fn decrypt(envelope: &EncryptedState, key_material: &[u8]) -> EnvelopeResult<Document> {
    let cipher = StateCipher::new(key_material)?;
    let sealed = STANDARD
        .decode(envelope.encrypted_data.as_bytes())
        .map_err(|e| EnvelopeError::Decode(format!("base64: {e}")))?;
    let plaintext = cipher.open(&sealed)?;
    serde_json::from_slice::<Document>(&plaintext)
        .map_err(|e| EnvelopeError::Decode(format!("state document: {e}")))
}

/// Open a stored document whose content is an envelope.
///
/// Key availability is checked before the envelope is inspected, so a
/// missing key always reports [`EnvelopeError::KeyMissing`].
pub fn decrypt_document(stored: &Document, key_material: &[u8]) -> EnvelopeResult<Document> {
    if key_material.is_empty() {
        return Err(EnvelopeError::KeyMissing);
    }
    let envelope =
        EncryptedState::from_document(stored).map_err(|e| EnvelopeError::Decode(e.to_string()))?;
    decrypt(&envelope, key_material)
}

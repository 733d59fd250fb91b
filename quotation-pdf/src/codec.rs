//! Reversible URL-safe encoding of a full quotation document.
//!
//! The whole document travels as a single query parameter, so the print host
//! page needs no server-side session. Canonical JSON is wrapped in unpadded
//! URL-safe base64: no characters requiring percent-escaping and no length
//! cap, so documents with hundreds of line items round-trip intact.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{AddContext, Error};
use crate::quotation::QuotationDocument;

/// Encode a document into a URL-safe token.
pub fn encode(document: &QuotationDocument) -> Result<String, Error> {
    let json = serde_json::to_string(document)
        .map_err(|e| Error::from(e.to_string()))
        .add_context("serializing quotation document")?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token back into a document. Exact inverse of [`encode`]:
/// `decode(&encode(d)?)? == d` for every valid document.
///
/// Fails with a `malformed_token` kind when the token cannot be reversed to
/// text, and with `invalid_document` when the reversed text is not a
/// well-formed document. The print host page renders a distinct message for
/// each.
pub fn decode(token: &str) -> Result<QuotationDocument, Error> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| Error::malformed_token(e.to_string()))
        .add_context("decoding quotation token")?;
    let json = String::from_utf8(bytes)
        .map_err(|e| Error::malformed_token(e.to_string()))
        .add_context("decoding quotation token")?;
    serde_json::from_str(&json)
        .map_err(|e| Error::invalid_document(e.to_string()))
        .add_context("parsing quotation document")
}

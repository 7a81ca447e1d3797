use serde_json::Value;

use super::conversion_error::ConversionError;
use crate::model::Document;

/// Domain interface for translating one provider's output shape to and from the canonical
/// document.
///
/// Implementations are stateless. A malformed segment or word fails the whole conversion;
/// no partial document is returned.
pub trait Converter: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fails when a required field is absent or malformed, naming its path.
    fn convert_to_canonical(&self, data: &Value) -> Result<Document, ConversionError>;

    /// Fails when the document lacks something the provider shape requires. Values stashed
    /// in the document's extensions take precedence over re-derived ones.
    fn convert_from_canonical(&self, doc: &Document) -> Result<Value, ConversionError>;
}

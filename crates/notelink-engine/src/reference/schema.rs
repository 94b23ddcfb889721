use crate::reference::TARGET_PATH;
use crate::schema::{SchemaItemDefinition, TEXT};

/// Allowed wherever text is, atomic, and carrying only `targetPath`.
pub fn reference_definition() -> SchemaItemDefinition {
    SchemaItemDefinition {
        allow_where: Some(TEXT.to_string()),
        allow_attributes: vec![TARGET_PATH.to_string()],
        is_inline: true,
        is_object: true,
        ..Default::default()
    }
}

// Field value rendering: value shapes, field metadata, and the renderer that
// turns one value into an ops fragment.

pub mod models;
pub mod renderer;

pub use models::{FieldCatalog, FieldDefinition, FieldId, FieldOption, FieldType, FieldValue};
pub use renderer::render;

//! Résumé data: parsing of every input format, validation, LaTeX sanitizing,
//! section rendering and assembly of the main document.

pub mod assemble;
pub mod form_input;
pub mod model;
pub mod normalize;
pub mod render;
pub mod sanitize;
pub mod text_input;
pub mod validation;

pub use assemble::{AnchorAssembler, TemplateAssembler};
pub use form_input::FormFields;
pub use model::ResumeRecord;
pub use normalize::{normalize, RawInput};
pub use render::{render_personal_info, render_sections, RenderedSections, SectionKind};

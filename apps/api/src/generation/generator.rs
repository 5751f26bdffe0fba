//! CV generation: turns a sanitized record into a job workspace on disk.
//!
//! Layout of a workspace:
//!
//! ```text
//! <workspace>/
//!   resume.tex          main document (base template with anchors replaced)
//!   awesome-cv.cls      class file with the requested theme applied
//!   resume/<stem>.tex   one file per non-empty section
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::AppError;
use crate::generation::styles::Style;
use crate::resume::{
    render_personal_info, render_sections, AnchorAssembler, RenderedSections, ResumeRecord,
    TemplateAssembler,
};

pub const BASE_TEMPLATE_FILE: &str = "resume.tex";
pub const CLASS_FILE: &str = "awesome-cv.cls";
/// Sub-directory of the workspace holding section files.
pub const SECTIONS_DIR: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Everything generated for one record, before it touches the disk.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub main: String,
    pub sections: RenderedSections,
}

/// Holds the base template and class file, loaded once at startup.
pub struct CvGenerator {
    base_template: String,
    class_template: String,
    assembler: Box<dyn TemplateAssembler>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

impl CvGenerator {
    /// Reads `resume.tex` and `awesome-cv.cls` from `template_dir`.
    pub fn load(template_dir: &Path) -> Result<Self, AppError> {
        let read = |name: &str| {
            let path = template_dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| {
                AppError::Template(format!("{name} not found in {}: {e}", template_dir.display()))
            })
        };
        let base_template = read(BASE_TEMPLATE_FILE)?;
        let class_template = read(CLASS_FILE)?;

        info!("Loaded templates from {}", template_dir.display());
        Ok(Self::from_parts(base_template, class_template))
    }

    pub fn from_parts(base_template: String, class_template: String) -> Self {
        Self {
            base_template,
            class_template,
            assembler: Box::new(AnchorAssembler),
        }
    }

    /// Renders sections and personal info, then assembles the main document.
    /// Deterministic: the same record always yields byte-identical output.
    pub fn generate(&self, record: &ResumeRecord) -> Result<GeneratedDocument, AppError> {
        let sections = render_sections(record);
        let personal_info = render_personal_info(record);
        let main = self
            .assembler
            .assemble(&self.base_template, &personal_info, &sections)?;
        Ok(GeneratedDocument { main, sections })
    }

    /// Writes the full workspace and returns the path of `<name>.tex`.
    pub async fn write_workspace(
        &self,
        record: &ResumeRecord,
        style: &Style,
        workspace: &Path,
        name: &str,
    ) -> Result<PathBuf, AppError> {
        let document = self.generate(record)?;

        let sections_dir = workspace.join(SECTIONS_DIR);
        tokio::fs::create_dir_all(&sections_dir).await?;

        for (kind, markup) in &document.sections {
            let path = sections_dir.join(format!("{}.tex", kind.file_stem()));
            tokio::fs::write(&path, markup).await?;
        }

        tokio::fs::write(workspace.join(CLASS_FILE), style.apply(&self.class_template)).await?;

        let main_path = workspace.join(format!("{name}.tex"));
        tokio::fs::write(&main_path, &document.main).await?;

        info!(
            "Wrote {} section(s) and {} to {}",
            document.sections.len(),
            main_path.display(),
            workspace.display()
        );
        Ok(main_path)
    }
}

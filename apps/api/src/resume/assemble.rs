//! Splices rendered markup into the base document at its anchors.

use crate::{errors::AppError, resume::render::RenderedSections};

pub const PERSONAL_INFO_MARKER: &str = "%\tPERSONAL INFORMATION";
pub const QUOTE_MARKER: &str = "\\quote{";
pub const SECTION_ANCHOR: &str = "\\input{resume/summary.tex}";
pub const END_DOCUMENT: &str = "\\end{document}";

const PERSONAL_INFO_HEADER: &str = "%\tPERSONAL INFORMATION\n\
%\tComment any of the lines below if they are not required\n\
%-------------------------------------------------------------------------------\n";

/// Produces the main document from a base template.
pub trait TemplateAssembler: Send + Sync {
    fn assemble(
        &self,
        base: &str,
        personal_info: &str,
        sections: &RenderedSections,
    ) -> Result<String, AppError>;
}

/// Replaces two regions of the base document:
///
/// * personal info: from [`PERSONAL_INFO_MARKER`] through the line holding
///   [`QUOTE_MARKER`], up to the next blank line;
/// * section inputs: from [`SECTION_ANCHOR`] up to the last blank line before
///   [`END_DOCUMENT`], replaced by one `\input` per rendered section.
///
/// Everything else is copied unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorAssembler;

impl AnchorAssembler {
    fn replace_personal_info(base: &str, personal_info: &str) -> Result<String, AppError> {
        let start = base.find(PERSONAL_INFO_MARKER).ok_or_else(|| {
            AppError::Template("personal information marker not found in base template".into())
        })?;
        let quote = base[start..]
            .find(QUOTE_MARKER)
            .map(|offset| start + offset)
            .ok_or_else(|| {
                AppError::Template("\\quote line not found after personal information".into())
            })?;
        let end = base[quote..]
            .find("\n\n")
            .map(|offset| quote + offset)
            .ok_or_else(|| {
                AppError::Template("personal information block is not terminated".into())
            })?;

        let mut out = String::with_capacity(base.len() + personal_info.len());
        out.push_str(&base[..start]);
        out.push_str(PERSONAL_INFO_HEADER);
        out.push_str(personal_info);
        out.push_str(&base[end..]);
        Ok(out)
    }

    fn replace_section_inputs(base: &str, sections: &RenderedSections) -> Result<String, AppError> {
        let start = base.find(SECTION_ANCHOR).ok_or_else(|| {
            AppError::Template("section input anchor not found in base template".into())
        })?;
        let end_doc = base[start..]
            .find(END_DOCUMENT)
            .map(|offset| start + offset)
            .ok_or_else(|| AppError::Template("\\end{document} not found".into()))?;
        let block_end = base[start..end_doc]
            .rfind("\n\n")
            .map(|offset| start + offset)
            .unwrap_or(end_doc);

        let mut inputs = String::from("\n");
        for kind in sections.keys() {
            inputs.push_str(&format!("\\input{{resume/{}.tex}}\n", kind.file_stem()));
        }

        let mut out = String::with_capacity(base.len());
        out.push_str(&base[..start]);
        out.push_str(&inputs);
        out.push_str(&base[block_end..]);
        Ok(out)
    }
}

impl TemplateAssembler for AnchorAssembler {
    fn assemble(
        &self,
        base: &str,
        personal_info: &str,
        sections: &RenderedSections,
    ) -> Result<String, AppError> {
        let with_header = Self::replace_personal_info(base, personal_info)?;
        Self::replace_section_inputs(&with_header, sections)
    }
}

//! Single entry point from any raw input to a validated, LaTeX-safe record.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    errors::AppError,
    resume::{
        form_input::{parse_form, FormFields},
        model::ResumeRecord,
        sanitize::{escape_latex, markdown_to_latex},
        text_input::parse_text,
        validation::validate_record,
    },
};

/// Résumé data as it arrives, before parsing.
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    Json(&'a str),
    Value(&'a Value),
    Text(&'a str),
    Form(&'a FormFields),
}

impl<'a> RawInput<'a> {
    /// Picks the parser from a file name: `.json` is JSON, anything else is text.
    pub fn from_file(file_name: &str, content: &'a str) -> Self {
        if file_name.to_lowercase().ends_with(".json") {
            RawInput::Json(content)
        } else {
            RawInput::Text(content)
        }
    }
}

fn record_from_value(value: &Value) -> Result<ResumeRecord, AppError> {
    if !value.is_object() {
        return Err(AppError::Parse(
            "résumé data must be a JSON object".to_string(),
        ));
    }
    ResumeRecord::deserialize(value)
        .map_err(|e| AppError::Parse(format!("Invalid résumé data: {e}")))
}

/// Parses any input format into a trimmed, unsanitized record.
pub fn parse_input(input: RawInput<'_>) -> Result<ResumeRecord, AppError> {
    let record = match input {
        RawInput::Json(text) => {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| AppError::Parse(format!("Invalid JSON format: {e}")))?;
            record_from_value(&value)?
        }
        RawInput::Value(value) => record_from_value(value)?,
        RawInput::Text(text) => parse_text(text),
        RawInput::Form(form) => parse_form(form),
    };
    Ok(record.tidy())
}

/// Escapes every free-text field for LaTeX. Summary and description items get
/// markdown conversion instead of plain escaping.
pub fn sanitize_record(record: ResumeRecord) -> ResumeRecord {
    record.map_text(|text, markdown| {
        if markdown {
            markdown_to_latex(text)
        } else {
            escape_latex(text)
        }
    })
}

/// Parse, validate, sanitize. Validation sees the raw values and reports every
/// violation at once.
pub fn normalize(input: RawInput<'_>) -> Result<ResumeRecord, AppError> {
    let record = parse_input(input)?;

    let errors = validate_record(&record);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    debug!(
        "Normalized record: {} work, {} education, {} skill entries",
        record.work_experience.len(),
        record.education.len(),
        record.skills.len()
    );
    Ok(sanitize_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADA_JSON: &str = r#"{
        "FirstName": "Ada",
        "LastName": "Lovelace",
        "Position": "Engineer",
        "Email": "ada@example.com",
        "Summary": "**Pioneer** of computing",
        "Work Experience": [{
            "Title": "Analyst",
            "Company": "Analytical Engine Co",
            "Location": "London",
            "Date": "1842 - 1843",
            "items": ["Wrote the first program", "Annotated Menabrea's notes"]
        }],
        "Education": [{"Degree": "Private tutoring", "Institution": "Home", "Location": "London", "Date": "1830s"}],
        "Skills": [{"Category": "Mathematics", "Skills": "Analysis, Logic"}],
        "Honors": [{"Name": "Ada language", "Issuer": "US DoD", "Location": "USA", "Date": "1980"}]
    }"#;

    const ADA_TEXT: &str = r#"
FirstName- "Ada"
LastName- "Lovelace"
Position- "Engineer"
Email- "ada@example.com"
Summary- "**Pioneer** of computing"

Section- "Work Experience"
Title- "Analyst"
Company- "Analytical Engine Co"
Location- "London"
Date- "1842 - 1843"
- Wrote the first program
- Annotated Menabrea's notes

Section- "Education"
Degree- "Private tutoring"
Institution- "Home"
Location- "London"
Date- "1830s"

Section- "Skills"
Category- "Mathematics"
Skills- "Analysis, Logic"

Section- "Honors"
Name- "Ada language"
Issuer- "US DoD"
Location- "USA"
Date- "1980"
"#;

    #[test]
    fn test_json_and_text_produce_same_record() {
        let from_json = normalize(RawInput::Json(ADA_JSON)).unwrap();
        let from_text = normalize(RawInput::Text(ADA_TEXT)).unwrap();
        assert_eq!(from_json, from_text);
        assert_eq!(from_json.summary, r"\textbf{Pioneer} of computing");
    }

    #[test]
    fn test_validation_reports_all_errors() {
        let err = normalize(RawInput::Json(r#"{"Position": "Engineer", "Email": "x"}"#))
            .unwrap_err();
        match err {
            AppError::Validation(errors) => assert_eq!(
                errors,
                vec![
                    "First Name is required",
                    "Last Name is required",
                    "Invalid email format",
                ]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_runs_before_escaping() {
        // An underscore in the email must not be escaped before the format check.
        let json = r#"{"FirstName": "Ada", "LastName": "L", "Position": "Eng", "Email": "ada_l@example.com"}"#;
        let record = normalize(RawInput::Json(json)).unwrap();
        assert_eq!(record.email, r"ada\_l@example.com");
    }

    #[test]
    fn test_malformed_and_non_object_json_are_parse_errors() {
        assert!(matches!(
            normalize(RawInput::Json("{not json")),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            normalize(RawInput::Json("[1, 2, 3]")),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_form_input_is_sanitized() {
        let mut form = FormFields::new();
        form.push("firstName", "Ada");
        form.push("lastName", "Lovelace");
        form.push("position", "R&D Lead");
        form.push("work_title[]", "Analyst");
        form.push("work_company[]", "Engine Co");
        form.push("work_description[]", "Cut costs 50%");

        let record = normalize(RawInput::Form(&form)).unwrap();
        assert_eq!(record.position, r"R\&D Lead");
        assert_eq!(record.work_experience[0].items, vec![r"Cut costs 50\%"]);
    }

    #[test]
    fn test_file_name_selects_parser() {
        assert!(matches!(RawInput::from_file("cv.JSON", "{}"), RawInput::Json(_)));
        assert!(matches!(RawInput::from_file("cv.txt", ""), RawInput::Text(_)));
    }
}

use std::sync::OnceLock;

use regex::Regex;

use crate::resume::model::ResumeRecord;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(https?://)?(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&/=]*)$",
        )
        .expect("url pattern is valid")
    })
}

/// Checks required personal fields and the format of email and profile URLs.
pub fn validate_personal_info(record: &ResumeRecord) -> Vec<String> {
    let mut errors = Vec::new();

    for (label, value) in [
        ("First Name", &record.first_name),
        ("Last Name", &record.last_name),
        ("Position", &record.position),
    ] {
        if value.is_empty() {
            errors.push(format!("{label} is required"));
        }
    }

    if !record.email.is_empty() && !email_re().is_match(&record.email) {
        errors.push("Invalid email format".to_string());
    }

    for (label, value) in [
        ("Homepage", &record.homepage),
        ("GitHub", &record.github),
        ("LinkedIn", &record.linkedin),
    ] {
        if !value.is_empty() && !url_re().is_match(value) {
            errors.push(format!("Invalid URL format for {label}"));
        }
    }

    errors
}

/// Checks the required fields of each work, education and skill entry.
/// Entries are numbered from 1.
pub fn validate_sections(record: &ResumeRecord) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, job) in record.work_experience.iter().enumerate() {
        let n = i + 1;
        if job.title.is_empty() {
            errors.push(format!("Work Experience #{n}: Title is required"));
        }
        if job.company.is_empty() {
            errors.push(format!("Work Experience #{n}: Company is required"));
        }
    }

    for (i, edu) in record.education.iter().enumerate() {
        let n = i + 1;
        if edu.degree.is_empty() {
            errors.push(format!("Education #{n}: Degree is required"));
        }
        if edu.institution.is_empty() {
            errors.push(format!("Education #{n}: Institution is required"));
        }
    }

    for (i, skill) in record.skills.iter().enumerate() {
        let n = i + 1;
        if skill.category.is_empty() {
            errors.push(format!("Skill #{n}: Category is required"));
        }
        if skill.skills.is_empty() {
            errors.push(format!("Skill #{n}: Skills list is required"));
        }
    }

    errors
}

/// All violations in check order: personal info first, then sections.
pub fn validate_record(record: &ResumeRecord) -> Vec<String> {
    let mut errors = validate_personal_info(record);
    errors.extend(validate_sections(record));
    errors
}

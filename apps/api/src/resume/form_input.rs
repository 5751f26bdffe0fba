//! Web-form input: repeated `name[]` fields zipped positionally into entries.

use std::collections::HashMap;

use crate::resume::model::{
    CertificateEntry, EducationEntry, HonorEntry, ResumeRecord, SkillEntry, WorkEntry,
};

/// Submitted form values in arrival order, keyed by field name with any `[]`
/// suffix removed.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    fields: HashMap<String, Vec<String>>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        let name = name.strip_suffix("[]").unwrap_or(name);
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    /// First value for a single-valued field, or "".
    pub fn first(&self, name: &str) -> &str {
        self.list(name).first().map(String::as_str).unwrap_or("")
    }

    pub fn list(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn at(&self, name: &str, index: usize) -> String {
        self.list(name).get(index).cloned().unwrap_or_default()
    }

    /// Description textarea at `index`, one item per line.
    fn items_at(&self, name: &str, index: usize) -> Vec<String> {
        self.list(name)
            .get(index)
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Indices of repeated entries whose primary field is filled in.
    fn filled(&self, primary: &str) -> impl Iterator<Item = usize> + '_ {
        self.list(primary)
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(index, _)| index)
    }
}

/// Builds an unsanitized record from submitted form fields.
pub fn parse_form(form: &FormFields) -> ResumeRecord {
    ResumeRecord {
        first_name: form.first("firstName").to_string(),
        last_name: form.first("lastName").to_string(),
        position: form.first("position").to_string(),
        address: form.first("address").to_string(),
        mobile: form.first("mobile").to_string(),
        email: form.first("email").to_string(),
        homepage: form.first("homepage").to_string(),
        github: form.first("github").to_string(),
        linkedin: form.first("linkedin").to_string(),
        twitter: form.first("twitter").to_string(),
        quote: form.first("quote").to_string(),
        summary: form.first("summary").to_string(),

        work_experience: form
            .filled("work_title")
            .map(|i| WorkEntry {
                title: form.at("work_title", i),
                company: form.at("work_company", i),
                location: form.at("work_location", i),
                date: form.at("work_date", i),
                items: form.items_at("work_description", i),
            })
            .collect(),
        education: form
            .filled("edu_degree")
            .map(|i| EducationEntry {
                degree: form.at("edu_degree", i),
                institution: form.at("edu_institution", i),
                location: form.at("edu_location", i),
                date: form.at("edu_date", i),
                items: form.items_at("edu_description", i),
            })
            .collect(),
        skills: form
            .filled("skill_category")
            .map(|i| SkillEntry {
                category: form.at("skill_category", i),
                skills: form.at("skill_list", i),
            })
            .collect(),
        certificates: form
            .filled("cert_name")
            .map(|i| CertificateEntry {
                name: form.at("cert_name", i),
                issuer: form.at("cert_issuer", i),
                location: form.at("cert_location", i),
                date: form.at("cert_date", i),
                items: form.items_at("cert_description", i),
            })
            .collect(),
        honors: form
            .filled("honor_name")
            .map(|i| HonorEntry {
                name: form.at("honor_name", i),
                issuer: form.at("honor_issuer", i),
                location: form.at("honor_location", i),
                date: form.at("honor_date", i),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        let mut fields = FormFields::new();
        for (name, value) in pairs {
            fields.push(name, *value);
        }
        fields
    }

    #[test]
    fn test_personal_fields() {
        let record = parse_form(&form(&[
            ("firstName", "Ada"),
            ("lastName", "Lovelace"),
            ("email", "ada@example.com"),
        ]));
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.last_name, "Lovelace");
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.position, "");
    }

    #[test]
    fn test_work_arrays_zip_by_position() {
        let record = parse_form(&form(&[
            ("work_title[]", "Analyst"),
            ("work_title[]", "Translator"),
            ("work_company[]", "Engine Co"),
            ("work_company[]", "Memoirs"),
            ("work_description[]", "Wrote programs\n\n  Reviewed notes  "),
        ]));
        assert_eq!(record.work_experience.len(), 2);
        assert_eq!(record.work_experience[0].company, "Engine Co");
        assert_eq!(
            record.work_experience[0].items,
            vec!["Wrote programs", "Reviewed notes"]
        );
        assert_eq!(record.work_experience[1].title, "Translator");
        assert!(record.work_experience[1].items.is_empty());
    }

    #[test]
    fn test_entries_without_primary_are_dropped() {
        let record = parse_form(&form(&[
            ("edu_degree[]", ""),
            ("edu_degree[]", "BSc"),
            ("edu_institution[]", "Nowhere"),
            ("edu_institution[]", "Home"),
            ("skill_category[]", "  "),
            ("skill_list[]", "Rust"),
        ]));
        assert_eq!(record.education.len(), 1);
        assert_eq!(record.education[0].degree, "BSc");
        assert_eq!(record.education[0].institution, "Home");
        assert!(record.skills.is_empty());
    }

    #[test]
    fn test_short_arrays_fill_with_empty() {
        let record = parse_form(&form(&[
            ("honor_name[]", "Medal"),
            ("honor_name[]", "Prize"),
            ("honor_issuer[]", "Society"),
        ]));
        assert_eq!(record.honors.len(), 2);
        assert_eq!(record.honors[1].issuer, "");
    }
}

//! Canonical résumé schema shared by every input format.
//!
//! JSON keys follow the documented input format ("FirstName", "Work Experience", ...).
//! Personal-info fields are always present; an empty string means "not provided".

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRecord {
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Mobile")]
    pub mobile: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Homepage")]
    pub homepage: String,
    #[serde(rename = "GitHub")]
    pub github: String,
    #[serde(rename = "LinkedIn")]
    pub linkedin: String,
    #[serde(rename = "Twitter")]
    pub twitter: String,
    #[serde(rename = "Quote")]
    pub quote: String,
    #[serde(rename = "Summary")]
    pub summary: String,

    #[serde(rename = "Work Experience")]
    pub work_experience: Vec<WorkEntry>,
    #[serde(rename = "Education")]
    pub education: Vec<EducationEntry>,
    #[serde(rename = "Skills")]
    pub skills: Vec<SkillEntry>,
    #[serde(rename = "Certificates")]
    pub certificates: Vec<CertificateEntry>,
    #[serde(rename = "Honors")]
    pub honors: Vec<HonorEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkEntry {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(rename = "Degree")]
    pub degree: String,
    #[serde(rename = "Institution")]
    pub institution: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

/// A skill group. Carries one free-text list instead of description items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillEntry {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Skills", deserialize_with = "string_or_list")]
    pub skills: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Issuer")]
    pub issuer: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HonorEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Issuer")]
    pub issuer: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// Accepts `"Rust, Go"` or `["Rust", "Go"]` for a skill list.
fn string_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s,
        StringOrList::Many(list) => list.join(", "),
    })
}

impl ResumeRecord {
    /// Applies `f` to every free-text field. `f` receives `true` for fields that
    /// accept markdown-like formatting (the summary and description items).
    pub fn map_text<F>(self, mut f: F) -> Self
    where
        F: FnMut(&str, bool) -> String,
    {
        let mut scalar = |s: String| f(&s, false);
        let first_name = scalar(self.first_name);
        let last_name = scalar(self.last_name);
        let position = scalar(self.position);
        let address = scalar(self.address);
        let mobile = scalar(self.mobile);
        let email = scalar(self.email);
        let homepage = scalar(self.homepage);
        let github = scalar(self.github);
        let linkedin = scalar(self.linkedin);
        let twitter = scalar(self.twitter);
        let quote = scalar(self.quote);

        let summary = f(&self.summary, true);

        let work_experience = self
            .work_experience
            .into_iter()
            .map(|e| WorkEntry {
                title: f(&e.title, false),
                company: f(&e.company, false),
                location: f(&e.location, false),
                date: f(&e.date, false),
                items: e.items.iter().map(|i| f(i, true)).collect(),
            })
            .collect();
        let education = self
            .education
            .into_iter()
            .map(|e| EducationEntry {
                degree: f(&e.degree, false),
                institution: f(&e.institution, false),
                location: f(&e.location, false),
                date: f(&e.date, false),
                items: e.items.iter().map(|i| f(i, true)).collect(),
            })
            .collect();
        let skills = self
            .skills
            .into_iter()
            .map(|e| SkillEntry {
                category: f(&e.category, false),
                skills: f(&e.skills, false),
            })
            .collect();
        let certificates = self
            .certificates
            .into_iter()
            .map(|e| CertificateEntry {
                name: f(&e.name, false),
                issuer: f(&e.issuer, false),
                location: f(&e.location, false),
                date: f(&e.date, false),
                items: e.items.iter().map(|i| f(i, true)).collect(),
            })
            .collect();
        let honors = self
            .honors
            .into_iter()
            .map(|e| HonorEntry {
                name: f(&e.name, false),
                issuer: f(&e.issuer, false),
                location: f(&e.location, false),
                date: f(&e.date, false),
            })
            .collect();

        ResumeRecord {
            first_name,
            last_name,
            position,
            address,
            mobile,
            email,
            homepage,
            github,
            linkedin,
            twitter,
            quote,
            summary,
            work_experience,
            education,
            skills,
            certificates,
            honors,
        }
    }

    /// Trims every scalar and drops blank description items, so that `items`
    /// is either empty or holds only non-empty strings.
    pub fn tidy(self) -> Self {
        let mut record = self.map_text(|s, _| s.trim().to_string());
        for entry in &mut record.work_experience {
            entry.items.retain(|i| !i.is_empty());
        }
        for entry in &mut record.education {
            entry.items.retain(|i| !i.is_empty());
        }
        for entry in &mut record.certificates {
            entry.items.retain(|i| !i.is_empty());
        }
        record
    }
}

//! Parser for the line-oriented text format:
//!
//! ```text
//! FirstName- "Ada"
//! Section- "Work Experience"
//! Title- "Analyst"
//! Company- "Analytical Engine Co"
//! - Wrote the first program
//! ```
//!
//! `Key- "Value"` lines are directives; `- text` lines add a description item
//! to the current entry.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::resume::model::{
    CertificateEntry, EducationEntry, HonorEntry, ResumeRecord, SkillEntry, WorkEntry,
};

/// Keys that open a new entry inside any section.
const ENTRY_START_KEYS: &[&str] = &["company", "organization", "title", "position"];

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^([^-]+)-\s*"([^"]*)"$"#).expect("directive pattern is valid"))
}

/// Lowercases and strips spaces/underscores so `First Name`, `first_name` and
/// `FirstName` all match.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Section names keep only letters and digits, so `Honors & Awards` and
/// `honors-awards` match `honorsawards`.
fn section_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// An entry type that can be filled one `Key- "Value"` line at a time.
trait TextEntry: Default {
    /// The key that names the entry (degree, category, ...).
    const PRIMARY: &'static str;

    fn slot(&mut self, key: &str) -> Option<&mut String>;

    fn items(&mut self) -> Option<&mut Vec<String>> {
        None
    }

    fn accepts(key: &str) -> bool {
        Self::default().slot(key).is_some()
    }
}

impl TextEntry for WorkEntry {
    const PRIMARY: &'static str = "title";

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "title" | "position" => Some(&mut self.title),
            "company" | "organization" => Some(&mut self.company),
            "location" => Some(&mut self.location),
            "date" | "dates" => Some(&mut self.date),
            _ => None,
        }
    }

    fn items(&mut self) -> Option<&mut Vec<String>> {
        Some(&mut self.items)
    }
}

impl TextEntry for EducationEntry {
    const PRIMARY: &'static str = "degree";

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "degree" => Some(&mut self.degree),
            "institution" | "school" => Some(&mut self.institution),
            "location" => Some(&mut self.location),
            "date" | "dates" => Some(&mut self.date),
            _ => None,
        }
    }

    fn items(&mut self) -> Option<&mut Vec<String>> {
        Some(&mut self.items)
    }
}

impl TextEntry for SkillEntry {
    const PRIMARY: &'static str = "category";

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "category" => Some(&mut self.category),
            "skills" => Some(&mut self.skills),
            _ => None,
        }
    }
}

impl TextEntry for CertificateEntry {
    const PRIMARY: &'static str = "name";

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "name" => Some(&mut self.name),
            "issuer" => Some(&mut self.issuer),
            "location" => Some(&mut self.location),
            "date" | "dates" => Some(&mut self.date),
            _ => None,
        }
    }

    fn items(&mut self) -> Option<&mut Vec<String>> {
        Some(&mut self.items)
    }
}

impl TextEntry for HonorEntry {
    const PRIMARY: &'static str = "name";

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "name" | "award" => Some(&mut self.name),
            "issuer" | "event" => Some(&mut self.issuer),
            "location" => Some(&mut self.location),
            "date" | "dates" => Some(&mut self.date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    TopLevel,
    Work,
    Education,
    Skills,
    Certificates,
    Honors,
    /// An unrecognized section; its lines are skipped.
    Ignored,
}

impl Target {
    fn for_section(name: &str) -> Self {
        match section_key(name).as_str() {
            "workexperience" | "experience" | "work" => Target::Work,
            "education" => Target::Education,
            "skills" => Target::Skills,
            "certificates" | "certifications" => Target::Certificates,
            "honors" | "honorsawards" | "honorsandawards" | "awards" => Target::Honors,
            _ => Target::Ignored,
        }
    }
}

/// Records `key = value` on the section list.
///
/// An entry-starting key appends a new entry unless the current entry has not
/// filled that field yet, so `Title` followed by `Company` stays one entry while a
/// second `Title` begins the next one.
fn apply_directive<E: TextEntry>(list: &mut Vec<E>, key: &str, value: &str) {
    if !E::accepts(key) {
        debug!("Ignoring unknown entry key '{key}'");
        return;
    }

    let starts_entry = ENTRY_START_KEYS.contains(&key) || key == E::PRIMARY;
    let needs_new = match list.last_mut() {
        None => true,
        Some(current) => starts_entry && current.slot(key).is_some_and(|s| !s.is_empty()),
    };
    if needs_new {
        list.push(E::default());
    }

    if let Some(slot) = list.last_mut().and_then(|entry| entry.slot(key)) {
        *slot = value.to_string();
    }
}

fn push_item<E: TextEntry>(list: &mut [E], item: &str) {
    match list.last_mut().and_then(TextEntry::items) {
        Some(items) => items.push(item.to_string()),
        None => debug!("Ignoring description item outside an entry: {item:?}"),
    }
}

fn set_top_level(record: &mut ResumeRecord, key: &str, value: &str) {
    let slot = match key {
        "firstname" => &mut record.first_name,
        "lastname" => &mut record.last_name,
        "position" => &mut record.position,
        "address" => &mut record.address,
        "mobile" | "phone" => &mut record.mobile,
        "email" => &mut record.email,
        "homepage" | "website" => &mut record.homepage,
        "github" => &mut record.github,
        "linkedin" => &mut record.linkedin,
        "twitter" => &mut record.twitter,
        "quote" => &mut record.quote,
        "summary" => &mut record.summary,
        _ => {
            debug!("Ignoring unknown top-level key '{key}'");
            return;
        }
    };
    *slot = value.to_string();
}

/// Parses the text format into an unsanitized record. Unrecognized lines are skipped.
pub fn parse_text(input: &str) -> ResumeRecord {
    let mut record = ResumeRecord::default();
    let mut target = Target::TopLevel;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = directive_re().captures(line) {
            let key = normalize_key(&caps[1]);
            let value = caps[2].trim();

            if key == "section" {
                target = Target::for_section(value);
                if target == Target::Ignored {
                    debug!("Ignoring unknown section '{value}'");
                }
                continue;
            }

            match target {
                Target::TopLevel => set_top_level(&mut record, &key, value),
                Target::Work => apply_directive(&mut record.work_experience, &key, value),
                Target::Education => apply_directive(&mut record.education, &key, value),
                Target::Skills => apply_directive(&mut record.skills, &key, value),
                Target::Certificates => apply_directive(&mut record.certificates, &key, value),
                Target::Honors => apply_directive(&mut record.honors, &key, value),
                Target::Ignored => {}
            }
        } else if let Some(item) = line.strip_prefix("- ") {
            let item = item.trim();
            match target {
                Target::Work => push_item(&mut record.work_experience, item),
                Target::Education => push_item(&mut record.education, item),
                Target::Certificates => push_item(&mut record.certificates, item),
                Target::Skills | Target::Honors => {
                    debug!("Section has no description items; skipping {item:?}")
                }
                Target::TopLevel | Target::Ignored => {}
            }
        } else {
            debug!("Skipping unrecognized line: {line:?}");
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_scalars() {
        let record = parse_text(
            r#"
FirstName- "Ada"
Last Name- "Lovelace"
position- "Engineer"
Email- "ada@example.com"
"#,
        );
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.last_name, "Lovelace");
        assert_eq!(record.position, "Engineer");
        assert_eq!(record.email, "ada@example.com");
    }

    #[test]
    fn test_title_then_company_is_one_entry() {
        let record = parse_text(
            r#"
Section- "Work Experience"
Title- "Analyst"
Company- "Analytical Engine Co"
Location- "London"
Date- "1842"
- Wrote the first program
- Annotated notes
Title- "Translator"
Company- "Scientific Memoirs"
"#,
        );
        assert_eq!(record.work_experience.len(), 2);
        let first = &record.work_experience[0];
        assert_eq!(first.title, "Analyst");
        assert_eq!(first.company, "Analytical Engine Co");
        assert_eq!(first.location, "London");
        assert_eq!(first.items, vec!["Wrote the first program", "Annotated notes"]);
        assert_eq!(record.work_experience[1].title, "Translator");
        assert!(record.work_experience[1].items.is_empty());
    }

    #[test]
    fn test_company_first_then_position() {
        let record = parse_text(
            "Section- \"Experience\"\nCompany- \"Acme\"\nPosition- \"Lead\"\nCompany- \"Globex\"\n",
        );
        assert_eq!(record.work_experience.len(), 2);
        assert_eq!(record.work_experience[0].company, "Acme");
        assert_eq!(record.work_experience[0].title, "Lead");
        assert_eq!(record.work_experience[1].company, "Globex");
    }

    #[test]
    fn test_section_keyword_is_case_insensitive_and_resets() {
        let record = parse_text(
            r#"
SECTION- "Education"
Degree- "BSc"
Institution- "Home"
section- "Skills"
Category- "Maths"
Skills- "Analysis"
Category- "Languages"
Skills- "French"
"#,
        );
        assert_eq!(record.education.len(), 1);
        assert_eq!(record.education[0].institution, "Home");
        assert_eq!(record.skills.len(), 2);
        assert_eq!(record.skills[1].category, "Languages");
        assert_eq!(record.skills[1].skills, "French");
    }

    #[test]
    fn test_items_without_entry_are_ignored() {
        let record = parse_text("Section- \"Work Experience\"\n- orphan item\n");
        assert!(record.work_experience.is_empty());
    }

    #[test]
    fn test_unknown_section_lines_skipped() {
        let record = parse_text(
            "Section- \"Hobbies\"\nName- \"Chess\"\n- Weekly club\nSection- \"Honors\"\nName- \"Medal\"\n",
        );
        assert_eq!(record.honors.len(), 1);
        assert_eq!(record.honors[0].name, "Medal");
        assert_eq!(record.first_name, "");
    }

    #[test]
    fn test_section_names_ignore_punctuation() {
        let record = parse_text(
            "Section- \"Honors & Awards\"\nName- \"Medal\"\nSection- \"Work-Experience\"\nTitle- \"Analyst\"\n",
        );
        assert_eq!(record.honors.len(), 1);
        assert_eq!(record.honors[0].name, "Medal");
        assert_eq!(record.work_experience.len(), 1);
    }

    #[test]
    fn test_non_entry_key_opens_entry_when_section_empty() {
        let record = parse_text("Section- \"Certificates\"\nIssuer- \"AWS\"\nName- \"SAA\"\n");
        assert_eq!(record.certificates.len(), 1);
        assert_eq!(record.certificates[0].issuer, "AWS");
        assert_eq!(record.certificates[0].name, "SAA");
    }
}

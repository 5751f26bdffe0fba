//! Renders a sanitized [`ResumeRecord`] into Awesome-CV markup.
//!
//! Every value is expected to be LaTeX-safe already; nothing is escaped here.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resume::model::ResumeRecord;

const RULE: &str = "%-------------------------------------------------------------------------------";
const ENTRY_RULE: &str = "%---------------------------------------------------------";

/// Document sections in the order they appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SectionKind {
    Summary,
    WorkExperience,
    Education,
    Skills,
    Certificates,
    Honors,
}

impl SectionKind {
    /// Heading printed by `\cvsection`.
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Summary => "Summary",
            SectionKind::WorkExperience => "Work Experience",
            SectionKind::Education => "Education",
            SectionKind::Skills => "Skills",
            SectionKind::Certificates => "Certificates",
            SectionKind::Honors => r"Honors \& Awards",
        }
    }

    /// Section file name without extension, under `resume/`.
    pub fn file_stem(self) -> &'static str {
        match self {
            SectionKind::Summary => "summary",
            SectionKind::WorkExperience => "experience",
            SectionKind::Education => "education",
            SectionKind::Skills => "skills",
            SectionKind::Certificates => "certificates",
            SectionKind::Honors => "honors",
        }
    }

    fn environment(self) -> &'static str {
        match self {
            SectionKind::Summary => "cvparagraph",
            SectionKind::WorkExperience | SectionKind::Education | SectionKind::Certificates => {
                "cventries"
            }
            SectionKind::Skills => "cvskills",
            SectionKind::Honors => "cvhonors",
        }
    }
}

/// Rendered markup per non-empty section, iterated in document order.
pub type RenderedSections = BTreeMap<SectionKind, String>;

/// Accumulates the lines of one section block.
struct SectionWriter {
    kind: SectionKind,
    lines: Vec<String>,
}

impl SectionWriter {
    fn new(kind: SectionKind) -> Self {
        let lines = vec![
            RULE.to_string(),
            "%\tSECTION TITLE".to_string(),
            RULE.to_string(),
            format!(r"\cvsection{{{}}}", kind.title()),
            String::new(),
            String::new(),
            RULE.to_string(),
            "%\tCONTENT".to_string(),
            RULE.to_string(),
            format!(r"\begin{{{}}}", kind.environment()),
        ];
        Self { kind, lines }
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// `\<command>` followed by one `{value} % comment` line per argument.
    fn entry(&mut self, command: &str, args: &[(&str, &str)]) {
        self.line("");
        self.line(ENTRY_RULE);
        self.line(format!("  \\{command}"));
        for (value, comment) in args {
            self.line(format!("    {{{value}}} % {comment}"));
        }
    }

    /// Trailing description argument of a `\cventry`; the list is omitted when empty.
    fn items(&mut self, items: &[String], comment: &str) {
        self.line("    {");
        if !items.is_empty() {
            self.line(format!(r"      \begin{{cvitems}} % {comment}"));
            for item in items {
                self.line(format!("        \\item {{{item}}}"));
            }
            self.line(r"      \end{cvitems}");
        }
        self.line("    }");
    }

    fn finish(mut self) -> String {
        self.line("");
        self.line(ENTRY_RULE);
        self.line(format!(r"\end{{{}}}", self.kind.environment()));
        self.lines.join("\n")
    }
}

fn render_summary(summary: &str) -> String {
    let mut w = SectionWriter::new(SectionKind::Summary);
    w.line("");
    w.line(ENTRY_RULE);
    w.line(summary);
    w.line(r"\end{cvparagraph}");
    w.lines.join("\n")
}

/// Renders every section that has content. Empty sections are absent from the map.
pub fn render_sections(record: &ResumeRecord) -> RenderedSections {
    let mut sections = RenderedSections::new();

    if !record.summary.is_empty() {
        sections.insert(SectionKind::Summary, render_summary(&record.summary));
    }

    if !record.work_experience.is_empty() {
        let mut w = SectionWriter::new(SectionKind::WorkExperience);
        for job in &record.work_experience {
            w.entry(
                "cventry",
                &[
                    (job.title.as_str(), "Job title"),
                    (job.company.as_str(), "Organization"),
                    (job.location.as_str(), "Location"),
                    (job.date.as_str(), "Date(s)"),
                ],
            );
            w.items(&job.items, "Description(s) of tasks/responsibilities");
        }
        sections.insert(SectionKind::WorkExperience, w.finish());
    }

    if !record.education.is_empty() {
        let mut w = SectionWriter::new(SectionKind::Education);
        for edu in &record.education {
            w.entry(
                "cventry",
                &[
                    (edu.degree.as_str(), "Degree"),
                    (edu.institution.as_str(), "Institution"),
                    (edu.location.as_str(), "Location"),
                    (edu.date.as_str(), "Date(s)"),
                ],
            );
            w.items(&edu.items, "Description(s)");
        }
        sections.insert(SectionKind::Education, w.finish());
    }

    if !record.skills.is_empty() {
        let mut w = SectionWriter::new(SectionKind::Skills);
        for skill in &record.skills {
            w.entry(
                "cvskill",
                &[(skill.category.as_str(), "Category"), (skill.skills.as_str(), "Skills")],
            );
        }
        sections.insert(SectionKind::Skills, w.finish());
    }

    if !record.certificates.is_empty() {
        let mut w = SectionWriter::new(SectionKind::Certificates);
        for cert in &record.certificates {
            w.entry(
                "cventry",
                &[
                    (cert.name.as_str(), "Certificate name"),
                    (cert.issuer.as_str(), "Issuer"),
                    (cert.location.as_str(), "Location"),
                    (cert.date.as_str(), "Date(s)"),
                ],
            );
            w.items(&cert.items, "Description(s)");
        }
        sections.insert(SectionKind::Certificates, w.finish());
    }

    if !record.honors.is_empty() {
        let mut w = SectionWriter::new(SectionKind::Honors);
        for honor in &record.honors {
            w.entry(
                "cvhonor",
                &[
                    (honor.name.as_str(), "Award"),
                    (honor.issuer.as_str(), "Event"),
                    (honor.location.as_str(), "Location"),
                    (honor.date.as_str(), "Date(s)"),
                ],
            );
        }
        sections.insert(SectionKind::Honors, w.finish());
    }

    sections
}

/// Header commands (`\name`, `\position`, contact and social lines, `\quote`),
/// one per line, emitted only for fields that are filled in.
pub fn render_personal_info(record: &ResumeRecord) -> String {
    let mut lines = Vec::new();

    if !record.first_name.is_empty() || !record.last_name.is_empty() {
        lines.push(format!(
            r"\name{{{}}}{{{}}}",
            record.first_name, record.last_name
        ));
    }

    for (command, value) in [
        ("position", &record.position),
        ("address", &record.address),
        ("mobile", &record.mobile),
        ("email", &record.email),
        ("homepage", &record.homepage),
        ("github", &record.github),
        ("linkedin", &record.linkedin),
        ("twitter", &record.twitter),
    ] {
        if !value.is_empty() {
            lines.push(format!("\\{command}{{{value}}}"));
        }
    }

    if !record.quote.is_empty() {
        lines.push(format!("\\quote{{\"{}\"}}", record.quote));
    }

    lines.join("\n")
}

//! Prompt Builder: fills the review templates with job context and document data.

use anyhow::Context;

use crate::document::{ExtractedDocument, FontConsistencyReport};
use crate::errors::ReviewError;
use crate::review::prompts::{
    BASIC_SYSTEM, BASIC_USER, BULLET_POINT_MODEL, BULLET_SCHEMA_FIELDS, DEFAULT_COMPANY,
    DEFAULT_JOB_TITLE, DEFAULT_MIN_QUALIFICATIONS, DEFAULT_PREFERRED_QUALIFICATIONS,
    DOS_AND_DONTS, EXTENDED_SYSTEM_TEMPLATE, EXTENDED_USER_TEMPLATE, FORMATTING_SCHEMA_TEMPLATE,
    MULTI_PAGE_FEEDBACK, SECTION_ORDER, SINGLE_PAGE_FEEDBACK,
};

/// The role a résumé is reviewed against. Unset fields fall back to the
/// built-in software-engineering defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobContext {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub min_qualifications: Option<String>,
    pub preferred_qualifications: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobField {
    Title,
    Company,
    MinQualifications,
    PreferredQualifications,
}

const JOB_FIELD_LABELS: [(&str, JobField); 5] = [
    ("job title:", JobField::Title),
    ("role:", JobField::Title),
    ("company:", JobField::Company),
    ("minimum qualifications:", JobField::MinQualifications),
    ("preferred qualifications:", JobField::PreferredQualifications),
];

impl JobContext {
    /// Reads per-request overrides from a chat message.
    ///
    /// Recognized labels start a line (`Company: Acme`, case-insensitive).
    /// Qualification values may continue over the following lines until a
    /// blank line or the next label.
    pub fn from_message(text: &str) -> Self {
        let mut job = JobContext::default();
        let mut current: Option<(JobField, Vec<String>)> = None;

        for line in text.lines() {
            let trimmed = line.trim();

            if let Some((field, rest)) = match_label(trimmed) {
                if let Some((field, lines)) = current.take() {
                    job.set(field, lines);
                }
                let lines = if rest.is_empty() { Vec::new() } else { vec![rest.to_string()] };
                current = Some((field, lines));
                continue;
            }

            let Some((field, lines)) = current.as_mut() else {
                continue;
            };
            if !trimmed.is_empty() && is_multiline(*field) {
                lines.push(trimmed.to_string());
            } else if let Some((field, lines)) = current.take() {
                job.set(field, lines);
            }
        }
        if let Some((field, lines)) = current {
            job.set(field, lines);
        }
        job
    }

    /// Fills every unset field from `defaults`.
    pub fn or(self, defaults: &JobContext) -> JobContext {
        JobContext {
            job_title: self.job_title.or_else(|| defaults.job_title.clone()),
            company: self.company.or_else(|| defaults.company.clone()),
            min_qualifications: self
                .min_qualifications
                .or_else(|| defaults.min_qualifications.clone()),
            preferred_qualifications: self
                .preferred_qualifications
                .or_else(|| defaults.preferred_qualifications.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &JobContext::default()
    }

    pub fn job_title(&self) -> &str {
        self.job_title.as_deref().unwrap_or(DEFAULT_JOB_TITLE)
    }

    pub fn company(&self) -> &str {
        self.company.as_deref().unwrap_or(DEFAULT_COMPANY)
    }

    pub fn min_qualifications(&self) -> &str {
        self.min_qualifications
            .as_deref()
            .unwrap_or(DEFAULT_MIN_QUALIFICATIONS)
    }

    pub fn preferred_qualifications(&self) -> &str {
        self.preferred_qualifications
            .as_deref()
            .unwrap_or(DEFAULT_PREFERRED_QUALIFICATIONS)
    }

    fn set(&mut self, field: JobField, lines: Vec<String>) {
        let value = lines.join("\n").trim().to_string();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            JobField::Title => &mut self.job_title,
            JobField::Company => &mut self.company,
            JobField::MinQualifications => &mut self.min_qualifications,
            JobField::PreferredQualifications => &mut self.preferred_qualifications,
        };
        *slot = Some(value);
    }
}

fn match_label(line: &str) -> Option<(JobField, &str)> {
    JOB_FIELD_LABELS.iter().find_map(|(label, field)| {
        let head = line.get(..label.len())?;
        head.eq_ignore_ascii_case(label)
            .then(|| (*field, line[label.len()..].trim()))
    })
}

fn is_multiline(field: JobField) -> bool {
    matches!(
        field,
        JobField::MinQualifications | JobField::PreferredQualifications
    )
}

/// System and user instructions for one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompts {
    pub system: String,
    pub user: String,
}

/// Inputs to the extended (formatting-aware) review.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedInputs<'a> {
    pub job: &'a JobContext,
    pub single_page: bool,
    pub document: &'a ExtractedDocument,
    pub fonts: &'a FontConsistencyReport,
    pub reference: &'a ExtractedDocument,
}

impl ReviewPrompts {
    /// Bullet-only review of experiences and projects.
    pub fn basic(job: &JobContext) -> Self {
        let schema = format!("{{\n{BULLET_SCHEMA_FIELDS}\n}}");
        let user = fill_template(
            BASIC_USER,
            &[
                ("job_title", job.job_title()),
                ("company", job.company()),
                ("schema", schema.as_str()),
            ],
        );
        Self {
            system: BASIC_SYSTEM.to_string(),
            user,
        }
    }

    /// Full review: bullets plus formatting compared against the reference résumé.
    pub fn extended(inputs: ExtendedInputs<'_>) -> Result<Self, ReviewError> {
        let job = inputs.job;
        let reference_json = serde_json::to_string(inputs.reference)
            .context("Failed to serialize reference document")?;
        let extracted_json = serde_json::to_string(inputs.document)
            .context("Failed to serialize extracted document")?;
        let schema = extended_schema(inputs.single_page)?;
        let page_feedback = if inputs.single_page {
            SINGLE_PAGE_FEEDBACK
        } else {
            MULTI_PAGE_FEEDBACK
        };

        let job_values = [
            ("job_title", job.job_title()),
            ("company", job.company()),
            ("min_qual", job.min_qualifications()),
            ("pref_qual", job.preferred_qualifications()),
        ];

        let mut system_values = vec![
            ("dos_and_donts", DOS_AND_DONTS),
            ("bullet_model", BULLET_POINT_MODEL),
            ("section_order", SECTION_ORDER),
            ("reference_json", reference_json.as_str()),
        ];
        system_values.extend(job_values);

        let mut user_values = vec![
            ("extracted_json", extracted_json.as_str()),
            ("font_feedback", inputs.fonts.feedback.as_str()),
            ("page_feedback", page_feedback),
            ("schema", schema.as_str()),
        ];
        user_values.extend(job_values);

        Ok(Self {
            system: fill_template(EXTENDED_SYSTEM_TEMPLATE, &system_values),
            user: fill_template(EXTENDED_USER_TEMPLATE, &user_values),
        })
    }
}

/// Response schema with `is_single_page` pre-filled from the measured page count.
fn extended_schema(single_page: bool) -> Result<String, ReviewError> {
    let feedback = if single_page {
        SINGLE_PAGE_FEEDBACK
    } else {
        MULTI_PAGE_FEEDBACK
    };
    let feedback =
        serde_json::to_string(feedback).context("Failed to encode single-page feedback")?;

    let formatting = fill_template(
        FORMATTING_SCHEMA_TEMPLATE,
        &[
            ("single_page_issue", if single_page { "false" } else { "true" }),
            ("single_page_feedback", feedback.as_str()),
            ("single_page_score", if single_page { "10" } else { "0" }),
        ],
    );

    Ok(format!("{{\n{BULLET_SCHEMA_FIELDS},\n{formatting}\n}}"))
}

/// Replaces each `{key}` marker in `template` in a single pass.
///
/// Substituted values are copied verbatim and never scanned for markers, so
/// document text cannot expand placeholders of its own. Braces that do not
/// enclose a known key are left as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let marker = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (end, *value))
        });
        match marker {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{analyze_font_consistency, TextFragment};

    #[test]
    fn test_defaults_apply_when_unset() {
        let job = JobContext::default();
        assert_eq!(job.job_title(), "Software Engineer");
        assert_eq!(job.company(), "Google");
        assert!(job.min_qualifications().contains("data structures"));
        assert!(job.is_empty());
    }

    #[test]
    fn test_from_message_reads_labels() {
        let text = "Please review my resume!\n\
                    job title: Backend Intern\n\
                    COMPANY:   Acme Corp\n\
                    Minimum Qualifications:\n\
                    - Rust\n\
                    - SQL\n\
                    \n\
                    thanks";
        let job = JobContext::from_message(text);
        assert_eq!(job.job_title.as_deref(), Some("Backend Intern"));
        assert_eq!(job.company.as_deref(), Some("Acme Corp"));
        assert_eq!(job.min_qualifications.as_deref(), Some("- Rust\n- SQL"));
        assert_eq!(job.preferred_qualifications, None);
    }

    #[test]
    fn test_from_message_role_alias_and_single_line_fields() {
        let job = JobContext::from_message("Role: SRE\nsome other words\nCompany: Initech");
        assert_eq!(job.job_title.as_deref(), Some("SRE"));
        assert_eq!(job.company.as_deref(), Some("Initech"));
    }

    #[test]
    fn test_from_message_without_labels_is_empty() {
        assert!(JobContext::from_message("here's my resume, roast it").is_empty());
        assert!(JobContext::from_message("Company:").is_empty());
    }

    #[test]
    fn test_or_prefers_overrides() {
        let defaults = JobContext {
            job_title: Some("Data Engineer".into()),
            company: Some("Globex".into()),
            ..Default::default()
        };
        let merged = JobContext {
            company: Some("Acme".into()),
            ..Default::default()
        }
        .or(&defaults);
        assert_eq!(merged.job_title(), "Data Engineer");
        assert_eq!(merged.company(), "Acme");
        assert_eq!(merged.min_qualifications(), DEFAULT_MIN_QUALIFICATIONS);
    }

    #[test]
    fn test_basic_prompt_embeds_job_and_schema() {
        let job = JobContext {
            job_title: Some("Firmware Engineer".into()),
            ..Default::default()
        };
        let prompts = ReviewPrompts::basic(&job);
        assert_eq!(prompts.system, BASIC_SYSTEM);
        assert!(prompts.user.contains("role of Firmware Engineer at Google"));
        assert!(prompts.user.contains("\"experiences\""));
        assert!(!prompts.user.contains("\"formatting\""));
        assert!(!prompts.user.contains("{schema}"));
    }

    fn extended(single_page: bool) -> ReviewPrompts {
        extended_with_text(single_page, "Jane Doe", "Jake Ryan")
    }

    fn extended_with_text(single_page: bool, resume: &str, reference: &str) -> ReviewPrompts {
        let document = ExtractedDocument {
            text: vec![TextFragment::plain(resume)],
            formatting: vec![],
        };
        let reference = ExtractedDocument {
            text: vec![TextFragment::plain(reference)],
            formatting: vec![],
        };
        let fonts = analyze_font_consistency(&document.formatting);
        ReviewPrompts::extended(ExtendedInputs {
            job: &JobContext::default(),
            single_page,
            document: &document,
            fonts: &fonts,
            reference: &reference,
        })
        .unwrap()
    }

    #[test]
    fn test_extended_prompt_fills_every_placeholder() {
        let prompts = extended(true);
        for placeholder in [
            "{job_title}",
            "{company}",
            "{min_qual}",
            "{pref_qual}",
            "{reference_json}",
            "{extracted_json}",
            "{schema}",
            "{single_page_score}",
        ] {
            assert!(!prompts.system.contains(placeholder), "{placeholder} in system");
            assert!(!prompts.user.contains(placeholder), "{placeholder} in user");
        }
        assert!(prompts.system.contains("Jake Ryan"));
        assert!(prompts.system.contains("What, How, Why"));
        assert!(prompts.user.contains("Jane Doe"));
        assert!(prompts.user.contains("\"formatting\""));
    }

    #[test]
    fn test_single_page_is_prefilled() {
        let prompts = extended(true);
        assert!(prompts.user.contains(
            r#""is_single_page": { "issue": false, "feedback": "Your resume is appropriately formatted to fit on a single page.", "suggestions": [string, string], "score": 10 }"#
        ));

        let prompts = extended(false);
        assert!(prompts
            .user
            .contains(r#""is_single_page": { "issue": true, "feedback": "Your resume exceeds one page."#));
        assert!(prompts.user.contains(r#""score": 0 }"#));
    }

    #[test]
    fn test_document_text_is_not_expanded() {
        let prompts = extended_with_text(
            false,
            "Skills: {schema} {job_title}",
            "Objective: {min_qual} {reference_json}",
        );

        assert_eq!(prompts.user.matches("\"is_single_page\"").count(), 1);
        assert!(prompts.user.contains("Skills: {schema} {job_title}"));
        assert!(prompts.system.contains("Objective: {min_qual} {reference_json}"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let filled = fill_template("{ \"a\": {x}, {unknown} {x", &[("x", "{x}")]);
        assert_eq!(filled, "{ \"a\": {x}, {unknown} {x");

        let filled = fill_template("{a}{b}", &[("a", "1"), ("b", "2")]);
        assert_eq!(filled, "12");
    }
}

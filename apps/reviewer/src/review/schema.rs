//! Schema Validator: turns raw model text into a [`ReviewResult`] or explains
//! exactly which fields broke the contract.
//!
//! Validation walks the JSON tree by hand rather than relying on serde errors
//! so that every violation is reported at once, each with its full path.
//! Unknown extra fields are ignored; missing required ones are not.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::errors::{FieldViolation, ReviewError};
use crate::review::models::{ReviewResult, FORMATTING_CATEGORIES};

pub const BULLET_SCORE_RANGE: RangeInclusive<i64> = 1..=10;
pub const FORMATTING_SCORE_RANGE: RangeInclusive<i64> = 0..=10;
pub const MAX_REWRITES: usize = 2;
pub const MAX_SUGGESTIONS: usize = 2;

/// Parses and validates the model's completion text.
///
/// Violations are logged with full detail before being returned; no attempt
/// is made to repair malformed output.
pub fn parse_feedback(raw: &str) -> Result<ReviewResult, ReviewError> {
    let text = strip_json_fences(raw);

    let mut value: Value = serde_json::from_str(text).map_err(|e| {
        error!("Failed to parse JSON from completion: {e}");
        error!("Raw completion: {raw}");
        ReviewError::Parse(e)
    })?;
    normalize_scores(&mut value);

    let violations = validate(&value);
    if !violations.is_empty() {
        for violation in &violations {
            error!("Validation error: {violation}");
        }
        return Err(ReviewError::Validation(violations));
    }

    let result: ReviewResult = serde_json::from_value(value).map_err(|e| {
        error!("Validated feedback failed to deserialize: {e}");
        ReviewError::Validation(vec![FieldViolation::new("$", e.to_string())])
    })?;

    for warning in policy_warnings(&result) {
        warn!("Feedback policy warning: {warning}");
    }

    Ok(result)
}

/// Checks a JSON value against the review schema, returning every violation.
pub fn validate(value: &Value) -> Vec<FieldViolation> {
    let mut checker = Checker::default();

    let Some(root) = value.as_object() else {
        checker.fail("$", format!("expected an object, found {}", kind(value)));
        return checker.violations;
    };

    if let Some(experiences) = checker.array(root, "", "experiences") {
        for (i, experience) in experiences.iter().enumerate() {
            let path = format!("experiences[{i}]");
            if let Some(obj) = checker.as_object(experience, &path) {
                checker.string(obj, &path, "company");
                checker.string(obj, &path, "role");
                checker.bullets(obj, &path);
            }
        }
    }

    if let Some(projects) = checker.array(root, "", "projects") {
        for (i, project) in projects.iter().enumerate() {
            let path = format!("projects[{i}]");
            if let Some(obj) = checker.as_object(project, &path) {
                checker.string(obj, &path, "title");
                checker.bullets(obj, &path);
            }
        }
    }

    match root.get("formatting") {
        None | Some(Value::Null) => {}
        Some(formatting) => checker.formatting(formatting),
    }

    checker.violations
}

/// Prompt-level rules the schema allows but the model was told not to break.
///
/// A 10/10 bullet should carry no rewrites and a 10/10 formatting category no
/// suggestions. These are reported, never rejected.
pub fn policy_warnings(result: &ReviewResult) -> Vec<String> {
    let mut warnings = Vec::new();

    let sections = result
        .experiences
        .iter()
        .enumerate()
        .map(|(i, e)| (format!("experiences[{i}]"), &e.bullets))
        .chain(
            result
                .projects
                .iter()
                .enumerate()
                .map(|(i, p)| (format!("projects[{i}]"), &p.bullets)),
        );

    for (section, bullets) in sections {
        for (j, bullet) in bullets.iter().enumerate() {
            if bullet.score == 10 && !bullet.rewrites.is_empty() {
                warnings.push(format!(
                    "{section}.bullets[{j}] scored 10/10 but carries {} rewrite(s)",
                    bullet.rewrites.len()
                ));
            }
        }
    }

    if let Some(formatting) = &result.formatting {
        for (key, category) in formatting.categories() {
            if category.score == 10 && !category.suggestions.is_empty() {
                warnings.push(format!(
                    "formatting.{key} scored 10/10 but carries {} suggestion(s)",
                    category.suggestions.len()
                ));
            }
        }
    }

    warnings
}

/// Rewrites integral float scores (`9.0`) as integers. Fractional scores are
/// left alone for validation to reject.
fn normalize_scores(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj.iter_mut() {
                if key == "score" {
                    if let Some(score) = integral(child) {
                        *child = Value::from(score);
                        continue;
                    }
                }
                normalize_scores(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_scores),
        _ => {}
    }
}

fn integral(value: &Value) -> Option<i64> {
    if value.is_i64() {
        return None;
    }
    let score = value.as_f64()?;
    (score.fract() == 0.0 && score.abs() <= i64::MAX as f64).then_some(score as i64)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(path, message));
    }

    fn required<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'v Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.fail(join(parent, key), "missing required field");
        }
        value
    }

    fn as_object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.fail(path, format!("expected an object, found {}", kind(value)));
        }
        obj
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some(value) = self.required(obj, parent, key) {
            if !value.is_string() {
                self.fail(
                    join(parent, key),
                    format!("expected a string, found {}", kind(value)),
                );
            }
        }
    }

    fn boolean(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some(value) = self.required(obj, parent, key) {
            if !value.is_boolean() {
                self.fail(
                    join(parent, key),
                    format!("expected a boolean, found {}", kind(value)),
                );
            }
        }
    }

    fn array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'v Vec<Value>> {
        let value = self.required(obj, parent, key)?;
        let array = value.as_array();
        if array.is_none() {
            self.fail(
                join(parent, key),
                format!("expected an array, found {}", kind(value)),
            );
        }
        array
    }

    fn integer_in(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        range: RangeInclusive<i64>,
    ) {
        let Some(value) = self.required(obj, parent, key) else {
            return;
        };
        let in_range = value.as_i64().is_some_and(|n| range.contains(&n));
        if !in_range {
            self.fail(
                join(parent, key),
                format!(
                    "must be an integer in [{}, {}], found {value}",
                    range.start(),
                    range.end()
                ),
            );
        }
    }

    /// An optional list of strings (absent means empty) with at most `max` items.
    fn string_list(&mut self, obj: &Map<String, Value>, parent: &str, key: &str, max: usize) {
        let path = join(parent, key);
        let items = match obj.get(key) {
            None => return,
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.fail(path, format!("expected an array, found {}", kind(other)));
                return;
            }
        };
        if items.len() > max {
            self.fail(
                path.clone(),
                format!("at most {max} items allowed, found {}", items.len()),
            );
        }
        for (i, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.fail(
                    format!("{path}[{i}]"),
                    format!("expected a string, found {}", kind(item)),
                );
            }
        }
    }

    fn bullets(&mut self, obj: &Map<String, Value>, parent: &str) {
        let Some(bullets) = self.array(obj, parent, "bullets") else {
            return;
        };
        for (i, bullet) in bullets.iter().enumerate() {
            let path = format!("{parent}.bullets[{i}]");
            if let Some(obj) = self.as_object(bullet, &path) {
                self.string(obj, &path, "content");
                self.string(obj, &path, "feedback");
                self.string_list(obj, &path, "rewrites", MAX_REWRITES);
                self.integer_in(obj, &path, "score", BULLET_SCORE_RANGE);
            }
        }
    }

    fn formatting(&mut self, value: &Value) {
        let Some(obj) = self.as_object(value, "formatting") else {
            return;
        };

        for key in FORMATTING_CATEGORIES {
            let Some(category) = self.required(obj, "formatting", key) else {
                continue;
            };
            let path = format!("formatting.{key}");
            if let Some(category) = self.as_object(category, &path) {
                self.boolean(category, &path, "issue");
                self.string(category, &path, "feedback");
                self.string_list(category, &path, "suggestions", MAX_SUGGESTIONS);
                self.integer_in(category, &path, "score", FORMATTING_SCORE_RANGE);
            }
        }

        if let Some(score) = self.required(obj, "formatting", "overall_score") {
            let valid = score.as_f64().is_some_and(|n| (0.0..=10.0).contains(&n));
            if !valid {
                self.fail(
                    "formatting.overall_score",
                    format!("must be a number in [0, 10], found {score}"),
                );
            }
        }
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bullet(score: Value, rewrites: Value) -> Value {
        json!({
            "content": "Built a REST API in Go",
            "feedback": "How many requests per second does it serve?",
            "rewrites": rewrites,
            "score": score
        })
    }

    fn with_bullet(bullet: Value) -> String {
        json!({
            "experiences": [{"company": "Acme", "role": "Intern", "bullets": [bullet]}],
            "projects": []
        })
        .to_string()
    }

    fn violations(raw: &str) -> Vec<FieldViolation> {
        match parse_feedback(raw) {
            Err(ReviewError::Validation(v)) => v,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    fn category(score: u8) -> Value {
        json!({"issue": false, "feedback": "Looks clean.", "suggestions": [], "score": score})
    }

    fn formatting() -> Map<String, Value> {
        let mut obj = Map::new();
        for key in FORMATTING_CATEGORIES {
            obj.insert(key.to_string(), category(8));
        }
        obj.insert("overall_score".to_string(), json!(8.5));
        obj
    }

    #[test]
    fn test_empty_sections_parse_to_empty_result() {
        let result = parse_feedback(r#"{"experiences": [], "projects": []}"#).unwrap();
        assert!(result.experiences.is_empty());
        assert!(result.projects.is_empty());
        assert!(result.formatting.is_none());
    }

    #[test]
    fn test_missing_projects_is_a_validation_error() {
        let v = violations(r#"{"experiences": []}"#);
        assert_eq!(v, vec![FieldViolation::new("projects", "missing required field")]);
    }

    #[test]
    fn test_three_rewrites_is_a_validation_error() {
        let raw = with_bullet(bullet(json!(6), json!(["a", "b", "c"])));
        let v = violations(&raw);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].path, "experiences[0].bullets[0].rewrites");
        assert!(v[0].message.contains("at most 2"));
    }

    #[test]
    fn test_bullet_scores_outside_range_are_rejected() {
        for score in [json!(0), json!(11), json!(7.5), json!("7"), json!(-3)] {
            let raw = with_bullet(bullet(score.clone(), json!([])));
            let v = violations(&raw);
            assert_eq!(v[0].path, "experiences[0].bullets[0].score", "score {score}");
        }
    }

    #[test]
    fn test_bullet_score_bounds_are_accepted() {
        for score in [1, 10] {
            let raw = with_bullet(bullet(json!(score), json!([])));
            assert!(parse_feedback(&raw).is_ok(), "score {score}");
        }
    }

    #[test]
    fn test_integral_float_scores_are_accepted() {
        let raw = with_bullet(bullet(json!(9.0), json!(["Served 2k rps"])));
        let result = parse_feedback(&raw).unwrap();
        assert_eq!(result.experiences[0].bullets[0].score, 9);

        let mut formatting = formatting();
        formatting.insert(
            "margins".to_string(),
            json!({"issue": false, "feedback": "Even.", "suggestions": [], "score": 10.0}),
        );
        let raw = json!({"experiences": [], "projects": [], "formatting": formatting}).to_string();
        let result = parse_feedback(&raw).unwrap();
        assert_eq!(result.formatting.unwrap().margins.score, 10);

        let raw = with_bullet(bullet(json!(11.0), json!([])));
        assert_eq!(violations(&raw)[0].path, "experiences[0].bullets[0].score");
    }

    #[test]
    fn test_perfect_score_with_rewrites_is_accepted_but_warned() {
        let raw = with_bullet(bullet(json!(10), json!(["Shipped a REST API in Go"])));
        let result = parse_feedback(&raw).unwrap();
        assert_eq!(result.experiences[0].bullets[0].score, 10);

        let warnings = policy_warnings(&result);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("experiences[0].bullets[0]"));
    }

    #[test]
    fn test_missing_rewrites_defaults_to_empty() {
        let raw = with_bullet(json!({
            "content": "Led a team of 4",
            "feedback": "Great.",
            "score": 10
        }));
        let result = parse_feedback(&raw).unwrap();
        assert!(result.experiences[0].bullets[0].rewrites.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let raw = json!({
            "summary": "extra",
            "experiences": [{
                "company": "Acme", "role": "SWE", "location": "Remote",
                "bullets": [{"content": "x", "feedback": "y", "rewrites": [], "score": 5, "tags": []}]
            }],
            "projects": []
        });
        assert!(parse_feedback(&raw.to_string()).is_ok());
    }

    #[test]
    fn test_reports_every_violation_with_paths() {
        let raw = json!({
            "experiences": [{"role": 3, "bullets": [{"content": "x", "score": 12}]}],
            "projects": [{"title": "Bot", "bullets": "none"}]
        });
        let paths: Vec<String> = violations(&raw.to_string())
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "experiences[0].company",
                "experiences[0].role",
                "experiences[0].bullets[0].feedback",
                "experiences[0].bullets[0].score",
                "projects[0].bullets",
            ]
        );
    }

    #[test]
    fn test_non_json_is_a_parse_error() {
        let err = parse_feedback("Here is my review of your resume!").unwrap_err();
        assert!(matches!(err, ReviewError::Parse(_)));
    }

    #[test]
    fn test_top_level_array_is_a_validation_error() {
        let v = violations("[]");
        assert_eq!(v[0].path, "$");
    }

    #[test]
    fn test_fenced_json_is_accepted() {
        let raw = "```json\n{\"experiences\": [], \"projects\": []}\n```";
        assert!(parse_feedback(raw).is_ok());
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_valid_formatting_section_parses() {
        let raw = json!({"experiences": [], "projects": [], "formatting": formatting()});
        let result = parse_feedback(&raw.to_string()).unwrap();
        let formatting = result.formatting.unwrap();
        assert_eq!(formatting.overall_score, 8.5);
        assert_eq!(formatting.margins.score, 8);
    }

    #[test]
    fn test_formatting_score_zero_is_valid_but_eleven_is_not() {
        let mut obj = formatting();
        obj.insert("is_single_page".to_string(), category(0));
        obj.insert("margins".to_string(), category(11));
        let raw = json!({"experiences": [], "projects": [], "formatting": obj});

        let v = violations(&raw.to_string());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].path, "formatting.margins.score");
    }

    #[test]
    fn test_formatting_missing_category_and_too_many_suggestions() {
        let mut obj = formatting();
        obj.remove("headings");
        obj.insert(
            "alignment".to_string(),
            json!({"issue": true, "feedback": "Ragged", "suggestions": ["a", "b", "c"], "score": 4}),
        );
        let raw = json!({"experiences": [], "projects": [], "formatting": obj});

        let paths: Vec<String> = violations(&raw.to_string())
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(
            paths,
            vec!["formatting.alignment.suggestions", "formatting.headings"]
        );
    }

    #[test]
    fn test_null_formatting_is_treated_as_absent() {
        let result =
            parse_feedback(r#"{"experiences": [], "projects": [], "formatting": null}"#).unwrap();
        assert!(result.formatting.is_none());
    }
}

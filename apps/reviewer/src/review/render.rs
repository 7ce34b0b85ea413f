//! Feedback Renderer: maps a validated review into platform-neutral display blocks.
//!
//! Everything here is pure. The bot adapter converts blocks into embeds and
//! sends them in order.

use crate::errors::ReviewError;
use crate::review::models::{Bullet, Formatting, FormattingCategory, ReviewResult};

pub const PROGRESS_TITLE: &str = "This could take a minute or two -- our reviewer is hard at work! 😜";
pub const INTRO_TITLE: &str = "Resume Feedback";
pub const INTRO_DESCRIPTION: &str = "Currently, the resume review tool will only give feedback on your bullet points for experiences and projects. This does not serve as a complete resume review, so you should still seek feedback from peers. Additionally, this tool relies on AI and may not always provide the best feedback, so take it with a grain of salt.";
pub const INTRO_DESCRIPTION_EXTENDED: &str = "The resume review tool will give feedback on your bullet points for experiences and projects, and on your formatting compared against a reference resume. This does not serve as a complete resume review, so you should still seek feedback from peers. Additionally, this tool relies on AI and may not always provide the best feedback, so take it with a grain of salt.";
pub const FAILURE_TITLE: &str = "Resume review failed";

/// Color bucket derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    /// 10
    A,
    /// 7 to 9
    B,
    /// 6
    C,
    /// Below 6
    D,
}

impl ScoreTier {
    pub fn from_score(score: i64) -> Self {
        match score {
            10 => ScoreTier::A,
            7..=9 => ScoreTier::B,
            6 => ScoreTier::C,
            _ => ScoreTier::D,
        }
    }

    /// RGB accent color.
    pub fn color(self) -> u32 {
        match self {
            ScoreTier::A => 0x00FF00,
            ScoreTier::B => 0x4BFFFF,
            ScoreTier::C => 0xFFCF40,
            ScoreTier::D => 0xFF4B4B,
        }
    }
}

pub fn score_color(score: i64) -> u32 {
    ScoreTier::from_score(score).color()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl DisplayField {
    fn block(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }
}

/// One message's worth of output: a title, optional description and accent,
/// and named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBlock {
    pub title: String,
    pub description: Option<String>,
    pub tier: Option<ScoreTier>,
    pub fields: Vec<DisplayField>,
}

impl DisplayBlock {
    fn header(title: String) -> Self {
        Self {
            title,
            description: None,
            tier: None,
            fields: Vec::new(),
        }
    }
}

/// Renders experiences, then projects, then formatting (when present).
pub fn render_review(result: &ReviewResult) -> Vec<DisplayBlock> {
    let mut blocks = Vec::new();

    for experience in &result.experiences {
        blocks.push(DisplayBlock::header(format!(
            "**Experience at {} - {}**",
            experience.company, experience.role
        )));
        blocks.extend(experience.bullets.iter().map(render_bullet));
    }

    for project in &result.projects {
        blocks.push(DisplayBlock::header(format!("**Project: {}**", project.title)));
        blocks.extend(project.bullets.iter().map(render_bullet));
    }

    if let Some(formatting) = &result.formatting {
        blocks.extend(render_formatting(formatting));
    }

    blocks
}

fn render_bullet(bullet: &Bullet) -> DisplayBlock {
    let mut fields = vec![
        DisplayField::block("", format!("> *{}*", bullet.content)),
        DisplayField::block("Feedback", format!("> {}", bullet.feedback)),
    ];
    if !bullet.rewrites.is_empty() {
        fields.push(DisplayField::block("Suggestion", quote_all(&bullet.rewrites)));
    }

    DisplayBlock {
        title: format!("{}/10", bullet.score),
        description: None,
        tier: Some(ScoreTier::from_score(i64::from(bullet.score))),
        fields,
    }
}

fn render_formatting(formatting: &Formatting) -> Vec<DisplayBlock> {
    let mut blocks = vec![DisplayBlock {
        title: "**Formatting**".to_string(),
        description: Some(format!("Overall score: {:.1}/10", formatting.overall_score)),
        tier: Some(ScoreTier::from_score(formatting.overall_score.round() as i64)),
        fields: Vec::new(),
    }];
    blocks.extend(
        formatting
            .categories()
            .into_iter()
            .map(|(key, category)| render_category(key, category)),
    );
    blocks
}

fn render_category(key: &str, category: &FormattingCategory) -> DisplayBlock {
    let mut fields = vec![DisplayField::block(
        "Feedback",
        format!("> {}", category.feedback),
    )];
    if !category.suggestions.is_empty() {
        fields.push(DisplayField::block(
            "Suggestion",
            quote_all(&category.suggestions),
        ));
    }

    DisplayBlock {
        title: format!("{}: {}/10", category_label(key), category.score),
        description: Some(if category.issue {
            "Needs attention".to_string()
        } else {
            "Looks good".to_string()
        }),
        tier: Some(ScoreTier::from_score(i64::from(category.score))),
        fields,
    }
}

/// `contact_information` → `Contact Information`.
fn category_label(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins items into one quoted block, a blank quoted line between each.
fn quote_all(items: &[String]) -> String {
    format!("> {}", items.join("\n\n> "))
}

/// Sent before a review starts.
pub fn progress_block() -> DisplayBlock {
    DisplayBlock::header(PROGRESS_TITLE.to_string())
}

/// Disclaimer sent ahead of the feedback, describing what the active mode covers.
pub fn intro_block(extended: bool) -> DisplayBlock {
    let description = if extended {
        INTRO_DESCRIPTION_EXTENDED
    } else {
        INTRO_DESCRIPTION
    };
    DisplayBlock {
        description: Some(description.to_string()),
        ..DisplayBlock::header(INTRO_TITLE.to_string())
    }
}

pub fn failure_block(error: &ReviewError) -> DisplayBlock {
    DisplayBlock {
        title: FAILURE_TITLE.to_string(),
        description: Some(error.user_message().to_string()),
        tier: Some(ScoreTier::D),
        fields: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::review::models::{Experience, Project};

    fn bullet(score: u8, rewrites: &[&str]) -> Bullet {
        Bullet {
            content: "Built a thing".to_string(),
            feedback: "How many users?".to_string(),
            rewrites: rewrites.iter().map(|r| r.to_string()).collect(),
            score,
        }
    }

    #[test]
    fn test_score_tiers() {
        let table = [
            (10, ScoreTier::A),
            (8, ScoreTier::B),
            (7, ScoreTier::B),
            (6, ScoreTier::C),
            (3, ScoreTier::D),
            (0, ScoreTier::D),
        ];
        for (score, tier) in table {
            assert_eq!(ScoreTier::from_score(score), tier, "score {score}");
        }
        assert_eq!(score_color(10), 0x00FF00);
        assert_eq!(score_color(9), 0x4BFFFF);
        assert_eq!(score_color(6), 0xFFCF40);
        assert_eq!(score_color(1), 0xFF4B4B);
    }

    #[test]
    fn test_bullet_block_fields() {
        let block = render_bullet(&bullet(9, &["Built X for 500 users", "Shipped X"]));
        assert_eq!(block.title, "9/10");
        assert_eq!(block.tier, Some(ScoreTier::B));
        assert_eq!(block.fields.len(), 3);
        assert_eq!(block.fields[0].name, "");
        assert_eq!(block.fields[0].value, "> *Built a thing*");
        assert_eq!(block.fields[1].value, "> How many users?");
        assert_eq!(
            block.fields[2].value,
            "> Built X for 500 users\n\n> Shipped X"
        );
    }

    #[test]
    fn test_no_rewrites_no_suggestion() {
        let block = render_bullet(&bullet(10, &[]));
        assert_eq!(block.tier, Some(ScoreTier::A));
        assert!(block.fields.iter().all(|f| f.name != "Suggestion"));
    }

    #[test]
    fn test_render_order() {
        let result = ReviewResult {
            experiences: vec![Experience {
                company: "Acme".into(),
                role: "Intern".into(),
                bullets: vec![bullet(5, &["x"]), bullet(10, &[])],
            }],
            projects: vec![Project {
                title: "Compiler".into(),
                bullets: vec![bullet(7, &[])],
            }],
            formatting: None,
        };
        let titles: Vec<_> = render_review(&result)
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "**Experience at Acme - Intern**",
                "5/10",
                "10/10",
                "**Project: Compiler**",
                "7/10",
            ]
        );
    }

    #[test]
    fn test_empty_result_renders_nothing() {
        let result = ReviewResult {
            experiences: vec![],
            projects: vec![],
            formatting: None,
        };
        assert!(render_review(&result).is_empty());
    }

    #[test]
    fn test_category_block() {
        let category = FormattingCategory {
            issue: true,
            feedback: "Margins vary".into(),
            suggestions: vec!["Use 0.5in".into()],
            score: 4,
        };
        let block = render_category("contact_information", &category);
        assert_eq!(block.title, "Contact Information: 4/10");
        assert_eq!(block.description.as_deref(), Some("Needs attention"));
        assert_eq!(block.tier, Some(ScoreTier::D));
        assert_eq!(block.fields[1].value, "> Use 0.5in");
    }

    #[test]
    fn test_fixed_blocks() {
        assert_eq!(progress_block().title, PROGRESS_TITLE);
        assert_eq!(intro_block(false).description.as_deref(), Some(INTRO_DESCRIPTION));
        assert!(INTRO_DESCRIPTION.contains("only give feedback on your bullet points"));

        let extended = intro_block(true);
        assert_eq!(extended.title, INTRO_TITLE);
        assert_eq!(extended.description.as_deref(), Some(INTRO_DESCRIPTION_EXTENDED));
        assert!(INTRO_DESCRIPTION_EXTENDED.contains("formatting"));
        assert!(!INTRO_DESCRIPTION_EXTENDED.contains("only give feedback"));

        let failure = failure_block(&ReviewError::Completion(LlmError::EmptyContent));
        assert_eq!(failure.tier, Some(ScoreTier::D));
        assert_eq!(
            failure.description.as_deref(),
            Some(ReviewError::Completion(LlmError::EmptyContent).user_message())
        );
    }
}

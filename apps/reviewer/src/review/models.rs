//! Structured feedback produced by one review.
//!
//! These are plain value objects deserialized once from a validated model
//! response. Range checks live in `review::schema`, not here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub content: String,
    pub feedback: String,
    /// 0–2 alternative phrasings. Empty when the bullet scored 10.
    #[serde(default)]
    pub rewrites: Vec<String>,
    /// 1–10.
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingCategory {
    pub issue: bool,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// 0–10.
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    pub font_consistency: FormattingCategory,
    pub font_choice: FormattingCategory,
    pub font_size: FormattingCategory,
    pub alignment: FormattingCategory,
    pub margins: FormattingCategory,
    pub line_spacing: FormattingCategory,
    pub section_spacing: FormattingCategory,
    pub headings: FormattingCategory,
    pub bullet_points: FormattingCategory,
    pub contact_information: FormattingCategory,
    pub overall_layout: FormattingCategory,
    pub page_utilization: FormattingCategory,
    pub is_single_page: FormattingCategory,
    pub consistency: FormattingCategory,
    pub overall_score: f64,
}

/// JSON keys of every formatting category, in display order.
pub const FORMATTING_CATEGORIES: [&str; 14] = [
    "font_consistency",
    "font_choice",
    "font_size",
    "alignment",
    "margins",
    "line_spacing",
    "section_spacing",
    "headings",
    "bullet_points",
    "contact_information",
    "overall_layout",
    "page_utilization",
    "is_single_page",
    "consistency",
];

impl Formatting {
    /// Every category paired with its JSON key, in [`FORMATTING_CATEGORIES`] order.
    pub fn categories(&self) -> [(&'static str, &FormattingCategory); 14] {
        [
            ("font_consistency", &self.font_consistency),
            ("font_choice", &self.font_choice),
            ("font_size", &self.font_size),
            ("alignment", &self.alignment),
            ("margins", &self.margins),
            ("line_spacing", &self.line_spacing),
            ("section_spacing", &self.section_spacing),
            ("headings", &self.headings),
            ("bullet_points", &self.bullet_points),
            ("contact_information", &self.contact_information),
            ("overall_layout", &self.overall_layout),
            ("page_utilization", &self.page_utilization),
            ("is_single_page", &self.is_single_page),
            ("consistency", &self.consistency),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub experiences: Vec<Experience>,
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<Formatting>,
}

impl ReviewResult {
    /// Iterates every bullet, experiences first.
    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.experiences
            .iter()
            .flat_map(|e| e.bullets.iter())
            .chain(self.projects.iter().flat_map(|p| p.bullets.iter()))
    }
}

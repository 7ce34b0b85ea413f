//! DisplayBlock → Discord embed, clamped to the platform's limits.

use serenity::builder::CreateEmbed;

use crate::review::DisplayBlock;

pub const TITLE_LIMIT: usize = 256;
pub const DESCRIPTION_LIMIT: usize = 4096;
pub const FIELD_NAME_LIMIT: usize = 256;
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Discord rejects empty field names and values; this renders as nothing.
const BLANK: &str = "\u{200B}";

pub fn to_embed(block: &DisplayBlock) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(clamp(&block.title, TITLE_LIMIT));

    if let Some(description) = &block.description {
        embed = embed.description(clamp(description, DESCRIPTION_LIMIT));
    }
    if let Some(tier) = block.tier {
        embed = embed.color(tier.color());
    }
    for field in &block.fields {
        embed = embed.field(
            non_empty(clamp(&field.name, FIELD_NAME_LIMIT)),
            non_empty(clamp(&field.value, FIELD_VALUE_LIMIT)),
            field.inline,
        );
    }
    embed
}

/// Truncates to at most `max` characters, marking the cut with an ellipsis.
pub fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn non_empty(text: String) -> String {
    if text.is_empty() {
        BLANK.to_string()
    } else {
        text
    }
}

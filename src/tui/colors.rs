//! Color constants and card age colouring for the terminal board.

use chrono::Duration;
use ratatui::style::Color;

use crate::config::AgeThreshold;
use crate::date::parse_duration;

/// Selected column border and selected card background.
pub const ACCENT: Color = Color::Rgb(0, 95, 135);
/// Unselected card background.
pub const CARD_BG: Color = Color::DarkGray;
/// Column border when the column is at or over its WIP limit.
pub const OVER_LIMIT: Color = Color::Red;
/// Blocked marker on cards.
pub const BLOCKED: Color = Color::LightRed;

/// Parse a configured colour: a name (`red`, `lightblue`), `#rrggbb` or an
/// ANSI index.
pub fn parse_color(name: &str) -> Option<Color> {
    name.trim().parse::<Color>().ok()
}

/// Colour of the highest threshold `age` has reached, if any.
///
/// Thresholds with an unparseable duration or colour are skipped.
pub fn age_color(thresholds: &[AgeThreshold], age: Duration) -> Option<Color> {
    thresholds
        .iter()
        .filter_map(|t| Some((parse_duration(&t.after)?, parse_color(&t.color)?)))
        .filter(|(after, _)| age >= *after)
        .max_by_key(|(after, _)| *after)
        .map(|(_, color)| color)
}

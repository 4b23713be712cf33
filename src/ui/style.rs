use console::style;
use std::fmt::Display;

/// White bold - titles, room banner
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim - timestamps, hints, secondary text
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Green bold - the player's own turns
pub fn user<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

/// Blue bold - the host's replies
pub fn host<D: Display>(text: D) -> String {
    style(text).blue().bold().to_string()
}

/// Yellow - recoverable problems the player should know about
pub fn warn<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Cyan - room ids and other values
pub fn value<D: Display>(text: D) -> String {
    style(text).cyan().to_string()
}

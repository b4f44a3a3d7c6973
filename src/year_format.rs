/*!
 * Year display rule.
 *
 * Positive years are shown as plain numbers; zero and negative years are
 * shown as their absolute value followed by the French BCE suffix.
 */

/// Suffix appended to years before the common era
pub const BCE_SUFFIX: &str = "av. J.-C.";

/// Format a year for display
pub fn format_year(year: i32) -> String {
    if year > 0 {
        year.to_string()
    } else {
        format!("{} {}", year.unsigned_abs(), BCE_SUFFIX)
    }
}

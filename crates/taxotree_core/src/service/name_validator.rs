//! Plausibility checks on single names and citation strings.
//!
//! Checks never fail; they only return the issues found.

use crate::model::issue::Issue;
use crate::model::name::Name;
use std::time::{SystemTime, UNIX_EPOCH};

/// Species Plantarum.
pub const MIN_YEAR: i32 = 1753;

/// True when opening and closing bracket counts differ.
pub fn has_unmatched_brackets(value: &str) -> bool {
    let open = value.chars().filter(|c| matches!(c, '(' | '[' | '{')).count();
    let close = value.chars().filter(|c| matches!(c, ')' | ']' | '}')).count();
    open != close
}

/// Issues of one name, judged against the latest plausible year `max_year`.
pub fn name_issues(name: &Name, max_year: i32) -> Vec<Issue> {
    let mut issues = Vec::new();
    let authorship = name.authorship.as_deref().map(str::trim);

    if name.parsed {
        if let Some(year) = name
            .combination_year
            .as_deref()
            .map(str::trim)
            .filter(|year| !year.is_empty())
        {
            match year.parse::<i32>() {
                Ok(year) if (MIN_YEAR..=max_year).contains(&year) => {}
                _ => issues.push(Issue::UnlikelyYear),
            }
        }

        let parts = [
            name.uninomial.as_deref(),
            name.genus.as_deref(),
            name.infrageneric_epithet.as_deref(),
            name.specific_epithet.as_deref(),
            name.infraspecific_epithet.as_deref(),
        ];
        let terminal = name
            .infraspecific_epithet
            .as_deref()
            .or(name.specific_epithet.as_deref());
        let author_equals_part = [name.uninomial.as_deref(), name.genus.as_deref(), terminal]
            .into_iter()
            .flatten()
            .any(|part| !part.trim().is_empty() && Some(part.trim()) == authorship);
        if author_equals_part {
            issues.push(Issue::AuthorshipUnlikely);
        }
        if parts.into_iter().flatten().any(has_unmatched_brackets) {
            issues.push(Issue::UnmatchedNameBrackets);
        }
    } else if [name.scientific_name.as_deref(), authorship]
        .into_iter()
        .flatten()
        .any(has_unmatched_brackets)
    {
        issues.push(Issue::UnmatchedNameBrackets);
    }

    let scientific_name = name.scientific_name.as_deref().map(str::trim);
    if scientific_name.is_some_and(|value| !value.is_empty())
        && scientific_name == authorship
        && !issues.contains(&Issue::AuthorshipUnlikely)
    {
        issues.push(Issue::AuthorshipUnlikely);
    }
    issues
}

/// Latest plausible publication year: next calendar year.
pub fn max_plausible_year() -> i32 {
    const SECONDS_PER_YEAR: f64 = 365.2425 * 24.0 * 3600.0;
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    1970 + (seconds as f64 / SECONDS_PER_YEAR) as i32 + 1
}

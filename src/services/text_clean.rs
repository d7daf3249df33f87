use itertools::Itertools;

/// Platform and legal boilerplate that disqualifies an organization
/// candidate. Case-insensitive substring match.
const ORGANIZATION_NOISE: [&str; 6] = [
    "exploreip",
    "collaboration opportunities",
    "licensing opportunity",
    "legal",
    "representation",
    "warranty",
];

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Collapses the duplicated-title rendering artifact: when a long title
/// is the exact same text twice, keep the first half. Exact match only;
/// near-duplicates pass through untouched.
pub fn clean_patent_title(title: &str) -> String {
    let title = collapse_whitespace(title);

    let words: Vec<&str> = title.split(' ').collect();
    if words.len() > 10 {
        let midpoint = words.len() / 2;
        let first_half = words[..midpoint].join(" ");
        let second_half = words[midpoint..].join(" ");

        if first_half.trim() == second_half.trim() {
            return first_half.trim().to_string();
        }
    }

    title
}

pub fn clean_organization(candidate: &str) -> String {
    let candidate = collapse_whitespace(candidate);
    let lowered = candidate.to_lowercase();

    match ORGANIZATION_NOISE
        .iter()
        .any(|noise| lowered.contains(noise))
    {
        true => String::new(),
        false => candidate,
    }
}

/// Order-preserving dedup for multi-valued fields (citations, family
/// members, classification codes, keywords).
pub fn dedup_values(values: Vec<String>) -> Vec<String> {
    values.into_iter().unique().collect()
}

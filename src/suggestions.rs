// Fuzzy-Name Suggestions
//
// "Did you mean?" support for reference diagnostics. Name lists are small
// (tens to low hundreds), so the classic O(len(a) * len(b)) edit-distance
// table per candidate is plenty.

/// Case-insensitive Levenshtein distance; insertion, deletion and
/// substitution each cost 1.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // One row of the DP table at a time.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Names within `max_distance` edits of `candidate`, sorted by
/// (distance ascending, name lexicographic ascending), capped to
/// `max_count`. Exact matches (distance 0) are never suggested.
pub fn find_suggestions(
    candidate: &str,
    known_names: &[String],
    max_distance: usize,
    max_count: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, &String)> = known_names
        .iter()
        .filter_map(|name| {
            let distance = edit_distance(candidate, name);
            (distance > 0 && distance <= max_distance).then_some((distance, name))
        })
        .collect();

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.truncate(max_count);
    scored.into_iter().map(|(_, name)| name.clone()).collect()
}

pub const DEFAULT_MAX_DISTANCE: usize = 2;
pub const DEFAULT_MAX_COUNT: usize = 3;

/// Render the standard suggestion phrase for a reference diagnostic, or
/// None when nothing is close enough.
pub fn suggestion_text(candidate: &str, known_names: &[String]) -> Option<String> {
    let matches = find_suggestions(
        candidate,
        known_names,
        DEFAULT_MAX_DISTANCE,
        DEFAULT_MAX_COUNT,
    );
    match matches.len() {
        0 => None,
        1 => Some(format!("did you mean '{}'?", matches[0])),
        _ => Some(format!(
            "did you mean one of: {}?",
            matches
                .iter()
                .map(|m| format!("'{}'", m))
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

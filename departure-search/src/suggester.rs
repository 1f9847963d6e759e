use std::cmp::Reverse;

use crate::similarity::levenshtein;

/// Ranks destination names as suggestions for a partially typed query.
///
/// # Does
/// * Keeps the candidates which contain the query as a substring, ignoring case
/// * An empty query keeps everything
/// * Orders the matches by descending edit distance to the typed text; ties
///   keep their input order
///
/// The descending order is deliberate: the visible suggestion order depends
/// on it, so flipping it to closest-first is a product decision, not a
/// cleanup.
pub fn rank<'a, I>(candidates: I, query: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = query.to_lowercase();
    let mut matches: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .map(|candidate| (levenshtein(candidate, query), candidate))
        .collect();
    matches.sort_by_key(|&(distance, _)| Reverse(distance));
    matches.into_iter().map(|(_, candidate)| candidate).collect()
}

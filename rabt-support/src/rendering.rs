//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, type names,
//! and suggestions in error output.

use std::collections::HashSet;

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use rabt_support::rendering::render_chain;
///
/// let chain = vec!["Engine", "Gearbox", "Engine"];
/// assert_eq!(render_chain(&chain), "Engine → Gearbox → Engine");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use rabt_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("garage::parts::Engine"), "Engine");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn garage::Vehicle>"),
///     "Arc<dyn Vehicle>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Edit distance between two strings, counted in chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Picks names from `available` that look like a typo of `requested`.
///
/// Names are compared by their shortened form, case-insensitively.
/// Substring matches rank first, then names within a small edit distance.
/// Results are ordered best first and capped at `max_suggestions`.
pub fn suggest_similar<'a>(
    requested: &str,
    available: impl IntoIterator<Item = &'a str>,
    max_suggestions: usize,
) -> Vec<&'a str> {
    let wanted = shorten_type_name(requested).to_lowercase();
    let tolerance = (wanted.chars().count() / 3).max(1);

    let mut seen = HashSet::new();
    let mut scored: Vec<(&'a str, usize)> = available
        .into_iter()
        .filter(|name| seen.insert(*name))
        .filter_map(|name| {
            let candidate = shorten_type_name(name).to_lowercase();
            if candidate == wanted {
                return Some((name, 0));
            }
            if candidate.contains(&wanted) || wanted.contains(&candidate) {
                return Some((name, 1));
            }
            let distance = edit_distance(&candidate, &wanted);
            (distance <= tolerance).then_some((name, distance + 1))
        })
        .collect();

    scored.sort_by_key(|&(_, score)| score);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_simple_chain() {
        assert_eq!(render_chain(&["A", "B", "A"]), "A → B → A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_nested_generics() {
        assert_eq!(
            shorten_type_name("core::option::Option<alloc::sync::Arc<app::Db>>"),
            "Option<Arc<Db>>"
        );
    }

    #[test]
    fn shorten_tuple_and_reference() {
        assert_eq!(shorten_type_name("(&app::A, app::B)"), "(&A, B)");
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("engine", "engine"), 0);
        assert_eq!(edit_distance("engine", "engin"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn suggests_typo() {
        let available = ["garage::Engine", "garage::Gearbox", "garage::Wheel"];
        let suggestions = suggest_similar("garage::Engien", available, 3);
        assert_eq!(suggestions, vec!["garage::Engine"]);
    }

    #[test]
    fn exact_short_name_ranks_first() {
        let available = ["other::EngineFactory", "other::Engine"];
        let suggestions = suggest_similar("garage::Engine", available, 3);
        assert_eq!(suggestions[0], "other::Engine");
    }

    #[test]
    fn repeated_names_are_suggested_once() {
        let available = [
            "garage::Engine",
            "garage::Wheel",
            "garage::Engine",
            "garage::Engines",
            "garage::Engine",
        ];
        let suggestions = suggest_similar("garage::Engine", available, 2);
        assert_eq!(suggestions, vec!["garage::Engine", "garage::Engines"]);
    }

    #[test]
    fn no_suggestion_for_unrelated() {
        let suggestions = suggest_similar("Database", ["garage::Wheel"], 3);
        assert!(suggestions.is_empty());
    }
}

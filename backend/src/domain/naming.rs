/// Duplicate-aware ordering and generation of display names like `Page (2)`
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Compare two display names so that `(n)` duplicate suffixes sort numerically
///
/// When both names share a prefix (case-insensitive) before their last `(`
/// and both suffixes hold a non-zero integer, the integers decide. Anything
/// else falls back to an ordinal, case-insensitive comparison of the full
/// names. An index of `0` is indistinguishable from an unparsable one, so
/// `Page (0)` always takes the fallback.
pub fn compare_similar_names(x: &str, y: &str) -> Ordering {
    if let (Some((x_prefix, x_index)), Some((y_prefix, y_index))) =
        (duplicate_suffix(x), duplicate_suffix(y))
    {
        if x_prefix.to_uppercase() == y_prefix.to_uppercase() && x_index != 0 && y_index != 0 {
            return x_index.cmp(&y_index);
        }
    }

    compare_ignore_case(x, y)
}

/// Sort names in place using [`compare_similar_names`]
pub fn sort_similar_names<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| compare_similar_names(a.as_ref(), b.as_ref()));
}

/// Pick a name that no sibling uses yet
///
/// Returns `candidate` when it is free. Otherwise any existing ` (n)` suffix
/// is stripped and the smallest free `base (n)` with `n >= 1` is returned.
pub fn unique_name<'a, I>(sibling_names: I, candidate: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<String> = sibling_names.into_iter().map(str::to_uppercase).collect();
    if !taken.contains(&candidate.to_uppercase()) {
        return candidate.to_string();
    }

    let base = suffix_regex()
        .captures(candidate)
        .and_then(|captures| captures.name("base"))
        .map(|base| base.as_str())
        .unwrap_or(candidate);

    let mut index = 1;
    loop {
        let attempt = format!("{} ({})", base, index);
        if !taken.contains(&attempt.to_uppercase()) {
            return attempt;
        }
        index += 1;
    }
}

/// Prefix before the last `(` and the parsed index, for names ending in `)`
fn duplicate_suffix(name: &str) -> Option<(&str, i32)> {
    if !name.ends_with(')') {
        return None;
    }
    let open = name.rfind('(')?;
    let inner = &name[open + 1..name.len() - 1];
    let index = inner.trim().parse::<i32>().unwrap_or(0);
    Some((&name[..open], index))
}

fn compare_ignore_case(x: &str, y: &str) -> Ordering {
    x.chars()
        .flat_map(char::to_uppercase)
        .cmp(y.chars().flat_map(char::to_uppercase))
}

fn suffix_regex() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| {
        Regex::new(r"^(?P<base>.+?) \((?P<index>\d+)\)$").expect("duplicate suffix pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_suffixes_sort_numerically() {
        let mut names = vec!["Page (10)", "Page (2)", "Page (1)"];
        sort_similar_names(&mut names);
        assert_eq!(names, vec!["Page (1)", "Page (2)", "Page (10)"]);
    }

    #[test]
    fn test_fallback_is_case_insensitive() {
        assert_eq!(compare_similar_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_similar_names("Banana", "apple"), Ordering::Greater);
        assert_eq!(compare_similar_names("PAGE", "page"), Ordering::Equal);
    }

    #[test]
    fn test_prefix_comparison_is_case_insensitive() {
        assert_eq!(compare_similar_names("page (10)", "Page (9)"), Ordering::Greater);
    }

    #[test]
    fn test_different_prefixes_use_string_order() {
        // "Alpha (10)" < "Beta (2)" by string order, regardless of the indices
        assert_eq!(compare_similar_names("Alpha (10)", "Beta (2)"), Ordering::Less);
    }

    #[test]
    fn test_unsuffixed_name_uses_string_order() {
        assert_eq!(compare_similar_names("Page", "Page (1)"), Ordering::Less);
    }

    #[test]
    fn test_zero_index_falls_back_to_string_order() {
        // Index 0 reads as "no index": "Page (0)" vs "Page (10)" compares as
        // strings, where '0' < '1' at the first differing position.
        assert_eq!(compare_similar_names("Page (0)", "Page (10)"), Ordering::Less);
        // Same fallback when the zero sits on the other side.
        assert_eq!(compare_similar_names("Page (9)", "Page (0)"), Ordering::Greater);
    }

    #[test]
    fn test_unparsable_index_falls_back_to_string_order() {
        assert_eq!(compare_similar_names("Page (copy)", "Page (2)"), Ordering::Greater);
    }

    #[test]
    fn test_unique_name_free_candidate() {
        assert_eq!(unique_name(vec!["Home", "About"], "Contact"), "Contact");
        assert_eq!(unique_name(Vec::new(), "Home"), "Home");
    }

    #[test]
    fn test_unique_name_appends_smallest_free_index() {
        assert_eq!(unique_name(vec!["Home"], "Home"), "Home (1)");
        assert_eq!(unique_name(vec!["Home", "Home (1)"], "home"), "home (2)");
        assert_eq!(unique_name(vec!["Home", "Home (2)"], "Home"), "Home (1)");
    }

    #[test]
    fn test_unique_name_strips_existing_suffix() {
        assert_eq!(
            unique_name(vec!["Home", "Home (1)"], "Home (1)"),
            "Home (2)"
        );
    }
}

use std::collections::BTreeSet;

/// Cache key for a layout of the given subontologies.
///
/// Characters outside `a-z` are stripped from the subontology part, so sets
/// that only differ in such characters share a key.
pub fn derive_key<I, S>(layout_name: &str, subs: I, separate_subs: bool) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sorted = subs
        .into_iter()
        .map(|sub| sub.as_ref().to_owned())
        .collect::<BTreeSet<_>>();
    let stripped = sorted
        .iter()
        .flat_map(|sub| sub.chars())
        .filter(char::is_ascii_lowercase)
        .collect::<String>();

    format!("layout{layout_name}{stripped}{separate_subs}")
}

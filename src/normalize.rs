//! String normalization for addresses and map-region names.

/// Fixed German transliteration table
const TRANSLITERATIONS: &[(char, &str)] = &[
    ('ü', "ue"),
    ('ä', "ae"),
    ('ö', "oe"),
    ('ß', "ss"),
    ('Ü', "Ue"),
    ('Ä', "Ae"),
    ('Ö', "Oe"),
];

/// Replace umlauts and ß with their ASCII transliterations
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Text before the first space, if there is one.
///
/// "Freiburg im Breisgau" becomes "Freiburg"; single words yield `None`.
pub fn first_word(s: &str) -> Option<&str> {
    let (head, _) = s.trim().split_once(' ')?;
    Some(head).filter(|h| !h.is_empty())
}

/// Ordered map-region names to try for an address: city, its first word,
/// state, its first word. Empty names and repeats are dropped.
pub fn region_candidates(city: &str, state: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(4);
    for place in [city.trim(), state.trim()] {
        for name in [Some(place), first_word(place)].into_iter().flatten() {
            if !name.is_empty() && !candidates.iter().any(|c| c == name) {
                candidates.push(name.to_string());
            }
        }
    }
    candidates
}

/// Lookup key for region catalogs: transliterated, lowercase, with spaces and
/// dashes folded to underscores ("Baden-Württemberg" -> "baden_wuerttemberg")
pub fn region_key(name: &str) -> String {
    transliterate(name.trim())
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

//! Reconciliation of free-text instructor names.
//!
//! The same person shows up as "Dr. Marina Elliott", "Prof. Elliot" or "marina elliott
//! PhD" across request forms and peer profiles. [`names_match`] is a heuristic: similar
//! surnames of different people are accepted as the same instructor.

const TITLES: [&str; 7] = ["dr", "professor", "prof", "mr", "mrs", "ms", "miss"];
const DEGREES: [&str; 5] = ["phd", "ma", "ba", "msc", "bsc"];
/// Degrees that are also common surnames.
const NAME_LIKE_DEGREES: [&str; 2] = ["ma", "ba"];

fn is_title(token: &str) -> bool {
    let bare = token.strip_suffix('.').unwrap_or(token).to_lowercase();
    TITLES.contains(&bare.as_str())
}

fn is_degree(token: &str) -> bool {
    let bare: String = token
        .chars()
        .filter(|character| *character != '.')
        .flat_map(char::to_lowercase)
        .collect();
    if !DEGREES.contains(&bare.as_str()) {
        return false;
    }
    if !NAME_LIKE_DEGREES.contains(&bare.as_str()) {
        return true;
    }
    // "Ma" or "Ba" written like a name is a surname, "MA" or "M.A." is a degree
    let mut characters = token.chars();
    let looks_like_name = characters.next().is_some_and(char::is_uppercase)
        && characters.all(char::is_lowercase);
    !looks_like_name
}

/// Lowercased name without honorifics, degrees and redundant whitespace.
#[must_use]
pub fn normalize(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();

    let titles = tokens
        .iter()
        .take(tokens.len().saturating_sub(1))
        .take_while(|token| is_title(token))
        .count();
    tokens.drain(..titles);

    while tokens.len() > 1 && tokens.last().is_some_and(|token| is_degree(token)) {
        tokens.pop();
        if let Some(last) = tokens.last_mut() {
            *last = last.trim_end_matches(',');
        }
    }

    tokens
        .iter()
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn surname(normalized: &str) -> &str {
    normalized.rsplit(' ').next().unwrap_or(normalized)
}

/// Whether two instructor names denote the same person. A blank name on either side
/// stands for "any instructor" and matches everything.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return true;
    }
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return true;
    }
    let (a, b) = (surname(&a), surname(&b));
    if a == b {
        return true;
    }
    a.chars().count().abs_diff(b.chars().count()) <= 1 && (a.contains(b) || b.contains(a))
}

/// Items that refer to the same instructor, labelled with the normalized name of the
/// first item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructorCluster<T> {
    pub label: String,
    pub members: Vec<T>,
}

/// Groups items by instructor. Each item joins the first cluster whose label it
/// matches, clusters keep the order in which they were first seen.
pub fn reconcile<T, F>(items: impl IntoIterator<Item = T>, name_of: F) -> Vec<InstructorCluster<T>>
where
    F: Fn(&T) -> &str,
{
    let mut clusters: Vec<InstructorCluster<T>> = Vec::new();
    for item in items {
        let name = name_of(&item);
        if let Some(cluster) = clusters
            .iter_mut()
            .find(|cluster| names_match(&cluster.label, name))
        {
            cluster.members.push(item);
        } else {
            clusters.push(InstructorCluster {
                label: normalize(name),
                members: vec![item],
            });
        }
    }
    clusters
}

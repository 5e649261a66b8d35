//! OS image resolution against the provider catalog.
//!
//! Selection is deterministic for a fixed catalog: filter by a
//! case-insensitive wildcard on the family name (optionally restricted
//! to a publisher), keep one entry per family, then take the most
//! recently published candidate.

use crate::types::OsImage;
use std::collections::HashSet;

/// Case-insensitive glob match supporting `*` and `?`.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let t: Vec<char> = text.to_lowercase().chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last '*' absorb one more character.
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Resolve the latest image matching a family filter.
///
/// Candidates are matched by wildcard on the family name and, when
/// `publisher_filter` is given, on the publisher. Each family
/// contributes its first catalog entry only; among those the most
/// recent `published_date` wins, ties keeping the earlier entry.
///
/// Returns `None` when nothing matches — the caller maps that to a
/// fatal resolution error.
pub fn resolve_latest<'a>(
    catalog: &'a [OsImage],
    family_filter: &str,
    publisher_filter: Option<&str>,
) -> Option<&'a OsImage> {
    let mut seen_families = HashSet::new();
    let mut best: Option<&OsImage> = None;

    for image in catalog {
        if !wildcard_match(family_filter, &image.family) {
            continue;
        }
        if let Some(publisher) = publisher_filter {
            if !wildcard_match(publisher, &image.publisher) {
                continue;
            }
        }
        if !seen_families.insert(image.family.to_lowercase()) {
            continue;
        }
        match best {
            Some(current) if image.published_date <= current.published_date => {}
            _ => best = Some(image),
        }
    }

    best
}

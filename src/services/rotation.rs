use crate::models::{Algorithm, UsageEntry};

/// What method selection decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodChoice {
    /// Show this method. `is_final` is set when the caller asked for it
    /// explicitly; natural rotation keeps prompting for a judgement.
    Chosen {
        algorithm: Algorithm,
        is_final: bool,
    },
    /// The user has judged every method; nothing left to offer.
    Exhausted,
}

/// Methods the user has already judged, in first-seen order with
/// duplicates collapsed.
pub fn distinct_methods(entries: &[UsageEntry]) -> Vec<Algorithm> {
    let mut seen = Vec::new();
    for entry in entries {
        if !seen.contains(&entry.algorithm) {
            seen.push(entry.algorithm);
        }
    }
    seen
}

/// The next rotation slot given how many distinct methods the user has
/// judged so far. The count indexes the rotation directly, so a user whose
/// only judgement was an out-of-order explicit pick moves to slot two
/// regardless of which method it named.
pub fn next_in_rotation(distinct_seen: usize) -> Option<Algorithm> {
    Algorithm::ROTATION.get(distinct_seen).copied()
}

/// Picks the method for a request. An explicit override always wins, even
/// for a user who has exhausted the rotation, and marks the response final
/// so the client stops prompting.
pub fn select(override_method: Option<Algorithm>, entries: &[UsageEntry]) -> MethodChoice {
    if let Some(algorithm) = override_method {
        return MethodChoice::Chosen {
            algorithm,
            is_final: true,
        };
    }
    match next_in_rotation(distinct_methods(entries).len()) {
        Some(algorithm) => MethodChoice::Chosen {
            algorithm,
            is_final: false,
        },
        None => MethodChoice::Exhausted,
    }
}

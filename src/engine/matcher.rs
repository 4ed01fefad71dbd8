//! Favorite-name matching.
//!
//! Scraped game names rarely match the configured favorite names exactly
//! (pluralization, punctuation, extra qualifiers), so matching runs through
//! three tiers, first match wins:
//!
//! 1. exact match after case-folding and whitespace normalization;
//! 2. every token of the favorite appears among the candidate's tokens,
//!    tolerating a per-token containment with length difference ≤ 2;
//! 3. substring containment in either direction, gated to favorites of
//!    length ≥ 3 where at least one side is multi-word.
//!
//! Tier 3 is deliberately excluded from [`matches_favorite_strict`], which
//! validates single targeted search results: containment alone once matched
//! "Fortune Snake" against "Gladiator's Glory"-style unrelated candidates.

/// Maximum length difference allowed for a tier-2 token containment.
const TOKEN_LEN_TOLERANCE: usize = 2;

/// Lowercase, trim, collapse runs of whitespace.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tier-2 token rule: exact token equality, or one token contains the other
/// with a length difference of at most two characters ("tiger" ~ "tigers").
fn tokens_match(found: &str, searched: &str) -> bool {
    if found == searched {
        return true;
    }
    if found.contains(searched) || searched.contains(found) {
        let diff = found.len().abs_diff(searched.len());
        return diff <= TOKEN_LEN_TOLERANCE;
    }
    false
}

fn all_words_present(candidate: &str, favorite: &str) -> bool {
    let favorite_words: Vec<&str> = favorite.split(' ').filter(|w| w.len() > 1).collect();
    if favorite_words.is_empty() {
        return false;
    }
    let candidate_words: Vec<&str> = candidate.split(' ').collect();
    favorite_words
        .iter()
        .all(|fw| candidate_words.iter().any(|cw| tokens_match(cw, fw)))
}

/// Full three-tier matcher used for batch filtering (FAVORITES keep-list,
/// RANDOM exclusion list).
pub fn matches_favorite(candidate: &str, favorite: &str) -> bool {
    let candidate = normalize(candidate);
    let favorite = normalize(favorite);
    if candidate.is_empty() || favorite.is_empty() {
        return false;
    }

    // Tier 1: exact
    if candidate == favorite {
        return true;
    }

    // Tier 2: all favorite tokens present
    if all_words_present(&candidate, &favorite) {
        return true;
    }

    // Tier 3: bidirectional containment, short-token guarded
    if favorite.len() >= 3
        && (candidate.contains(&favorite) || favorite.contains(&candidate))
        && (favorite.contains(' ') || candidate.contains(' '))
    {
        return true;
    }

    false
}

/// Strict variant (tiers 1–2 only) for validating a single targeted search
/// result against the name that was searched for.
pub fn matches_favorite_strict(candidate: &str, favorite: &str) -> bool {
    let candidate = normalize(candidate);
    let favorite = normalize(favorite);
    if candidate.is_empty() || favorite.is_empty() {
        return false;
    }
    candidate == favorite || all_words_present(&candidate, &favorite)
}

/// True if the candidate matches any configured favorite (full matcher).
pub fn is_favorite(candidate: &str, favorites: &[String]) -> bool {
    favorites.iter().any(|f| matches_favorite(candidate, f))
}

/// Strict-matcher variant of [`is_favorite`], for validating search results.
pub fn is_favorite_strict(candidate: &str, favorites: &[String]) -> bool {
    favorites.iter().any(|f| matches_favorite_strict(candidate, f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_after_normalization() {
        assert!(matches_favorite("  Fortune   Tiger ", "fortune tiger"));
    }

    #[test]
    fn plural_tolerance_matches() {
        // Tier 2: "tiger" is contained in "tigers" with diff 1.
        assert!(matches_favorite("Fortune Tigers", "Fortune Tiger"));
        assert!(matches_favorite_strict("Fortune Tigers", "Fortune Tiger"));
    }

    #[test]
    fn unrelated_games_do_not_match() {
        assert!(!matches_favorite_strict("Gladiator's Glory", "Fortune Snake"));
        assert!(!matches_favorite("Gladiator's Glory", "Fortune Snake"));
    }

    #[test]
    fn token_tolerance_is_bounded() {
        // "ox" vs "oxford": containment but diff 4 > 2, so tier 2 refuses.
        assert!(!tokens_match("oxford", "ox"));
        assert!(tokens_match("tigers", "tiger"));
        assert!(tokens_match("bonus", "bonus"));
    }

    #[test]
    fn containment_requires_multiword_side() {
        // Single short words on both sides must not match by containment.
        assert!(!matches_favorite("cat", "catapult"));
        // Multi-word side makes containment acceptable.
        assert!(matches_favorite("Mega Fortune Tiger Deluxe", "fortune tiger"));
    }

    #[test]
    fn containment_requires_min_length() {
        assert!(!matches_favorite("Big Bass Bonanza", "zz"));
    }

    #[test]
    fn is_favorite_scans_whole_list() {
        let favorites = vec!["Fortune Tiger".to_string(), "Fortune Ox".to_string()];
        assert!(is_favorite("Fortune Ox", &favorites));
        assert!(!is_favorite("Sweet Bonanza", &favorites));
    }
}

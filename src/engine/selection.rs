use rand::seq::SliceRandom;
use rand::thread_rng;

use super::matcher;
use crate::models::Signal;

/// Turns a raw scraped batch into the signals to deliver this cycle.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    /// RANDOM mode takes at most this many signals per cycle.
    pub random_pick_count: usize,
    /// RANDOM mode only considers signals strictly above this distribution.
    pub min_distribution_percent: f64,
}

impl SelectionEngine {
    pub fn new(random_pick_count: usize, min_distribution_percent: f64) -> Self {
        Self {
            random_pick_count,
            min_distribution_percent,
        }
    }

    /// FAVORITES mode: keep only signals matching a configured favorite.
    /// Search results are validated with the strict matcher; the site's
    /// search is fuzzy enough to return unrelated games. Non-matching
    /// results are dropped and counted, not treated as errors.
    pub fn filter_favorites(&self, batch: Vec<Signal>, favorites: &[String]) -> Vec<Signal> {
        let total = batch.len();
        let kept: Vec<Signal> = batch
            .into_iter()
            .filter(|signal| {
                let keep = matcher::is_favorite_strict(&signal.name, favorites);
                if !keep {
                    tracing::debug!(game = %signal.name, "Dropping non-favorite search result");
                }
                keep
            })
            .collect();

        if kept.len() < total {
            tracing::info!(
                dropped = total - kept.len(),
                kept = kept.len(),
                "Favorites filter discarded unmatched results"
            );
        }
        kept
    }

    /// RANDOM mode: exclude favorites and weak distributions, then sample
    /// uniformly up to the pick count. A final favorite re-check runs on the
    /// sample; anything caught is dropped and backfilled from the pool.
    pub fn pick_random(&self, batch: Vec<Signal>, favorites: &[String]) -> Vec<Signal> {
        let total = batch.len();
        let mut excluded_favorites = 0usize;
        let mut excluded_weak = 0usize;

        let mut pool: Vec<Signal> = batch
            .into_iter()
            .filter(|signal| {
                if matcher::is_favorite(&signal.name, favorites) {
                    excluded_favorites += 1;
                    return false;
                }
                if signal.distribution_percent <= self.min_distribution_percent {
                    excluded_weak += 1;
                    return false;
                }
                true
            })
            .collect();

        tracing::info!(
            total,
            excluded_favorites,
            excluded_weak,
            pool = pool.len(),
            "Random-mode pool built"
        );

        if pool.is_empty() {
            return Vec::new();
        }

        pool.shuffle(&mut thread_rng());
        let mut picked: Vec<Signal> = pool
            .drain(..self.random_pick_count.min(pool.len()))
            .collect();

        // Defense in depth: the loose matcher runs again on the sample; if a
        // favorite slipped through, drop it and backfill from the remainder.
        let before = picked.len();
        picked.retain(|signal| {
            let is_fav = matcher::is_favorite(&signal.name, favorites);
            if is_fav {
                tracing::warn!(game = %signal.name, "Favorite found in random sample — removing");
            }
            !is_fav
        });
        if picked.len() < before {
            for signal in pool {
                if picked.len() >= self.random_pick_count {
                    break;
                }
                if !matcher::is_favorite(&signal.name, favorites) {
                    picked.push(signal);
                }
            }
        }

        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn signal(name: &str, distribution: f64) -> Signal {
        Signal {
            name: name.into(),
            id: None,
            category: Category::Pg,
            distribution_percent: distribution,
            bet_min: None,
            bet_default: None,
            bet_max: None,
            bet_bonus: None,
            bet_connection: None,
            bet_extra: None,
            image_ref: None,
            href: None,
        }
    }

    fn engine() -> SelectionEngine {
        SelectionEngine::new(5, 80.0)
    }

    #[test]
    fn random_excludes_favorites_and_weak_distributions() {
        let favorites = vec!["Fortune Tiger".to_string(), "Fortune Ox".to_string()];
        let batch = vec![
            signal("Fortune Tiger", 95.0),
            signal("Fortune Ox", 90.0),
            signal("Sweet Bonanza", 81.0),
            signal("Gates of Olympus", 92.0),
            signal("Sugar Rush", 99.0),
            signal("Starlight Princess", 80.0), // exactly at cutoff: excluded
            signal("Big Bass Bonanza", 60.0),
            signal("Wild West Gold", 75.0),
        ];

        let picked = engine().pick_random(batch, &favorites);

        assert_eq!(picked.len(), 3);
        for s in &picked {
            assert!(s.distribution_percent > 80.0);
            assert!(!matcher::is_favorite(&s.name, &favorites));
        }
    }

    #[test]
    fn random_caps_at_pick_count() {
        let batch: Vec<Signal> = (0..12).map(|i| signal(&format!("Game {i}"), 90.0)).collect();
        let picked = engine().pick_random(batch, &[]);
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn random_empty_pool_yields_zero() {
        let batch = vec![signal("Weak Game", 50.0)];
        assert!(engine().pick_random(batch, &[]).is_empty());
    }

    #[test]
    fn random_sample_is_favorite_free_under_fuzzy_names() {
        // Plural form is not in the name list verbatim but the matcher still
        // catches it; the sample must come back favorite-free and full.
        let favorites = vec!["Fortune Tiger".to_string()];
        let mut batch = vec![signal("Fortune Tigers", 95.0)];
        for i in 0..8 {
            batch.push(signal(&format!("Neutral Game {i}"), 90.0));
        }

        let picked = engine().pick_random(batch, &favorites);

        assert_eq!(picked.len(), 5);
        assert!(picked.iter().all(|s| !matcher::is_favorite(&s.name, &favorites)));
    }

    #[test]
    fn favorites_filter_drops_unmatched() {
        let favorites = vec!["Fortune Tiger".to_string()];
        let batch = vec![signal("Fortune Tiger", 92.0), signal("Sweet Bonanza", 95.0)];
        let kept = engine().filter_favorites(batch, &favorites);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Fortune Tiger");
    }
}

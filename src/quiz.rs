//! Quiz question selection.
//!
//! Candidates are fetched from the store as ids, filtered against the ids the
//! player has already seen, and one is drawn uniformly from an injected random
//! source. Seeding that source makes draws reproducible.

use crate::db::Question;
use crate::store::{StoreResult, TriviaStore};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Category selector as sent by clients: absent, `null` and `0` all mean
/// "every category".
pub fn category_filter(raw: Option<i64>) -> Option<i64> {
    raw.filter(|id| *id != 0)
}

/// Draw one id from `candidates` that is not in `exclude`.
pub fn pick<R: Rng + ?Sized>(
    candidates: &[i64],
    exclude: &HashSet<i64>,
    rng: &mut R,
) -> Option<i64> {
    let eligible: Vec<i64> = candidates
        .iter()
        .copied()
        .filter(|id| !exclude.contains(id))
        .collect();
    eligible.choose(rng).copied()
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Next question for a quiz round, or `None` once the pool is exhausted.
///
/// An id deleted between listing and loading is dropped and the draw repeated.
#[instrument(skip_all, fields(category = ?category, seen = previous.len()))]
pub async fn next_question(
    store: &dyn TriviaStore,
    category: Option<i64>,
    previous: &[i64],
    rng: &Mutex<StdRng>,
) -> StoreResult<Option<Question>> {
    let candidates = store.question_ids(category_filter(category)).await?;
    let mut exclude: HashSet<i64> = previous.iter().copied().collect();
    loop {
        let picked = {
            let mut rng = rng.lock().await;
            pick(&candidates, &exclude, &mut *rng)
        };
        debug!(candidates = candidates.len(), ?picked, "quiz draw");
        let Some(id) = picked else {
            return Ok(None);
        };
        match store.find_question(id).await? {
            Some(question) => return Ok(Some(question)),
            None => {
                debug!(id, "drawn question vanished");
                exclude.insert(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, NewQuestion};
    use crate::store::StoreError;
    use async_trait::async_trait;

    /// Lists ids some of which no longer resolve to a row.
    struct StaleIds {
        ids: Vec<i64>,
        live: Vec<Question>,
    }

    #[async_trait]
    impl TriviaStore for StaleIds {
        async fn list_questions(&self) -> StoreResult<Vec<Question>> {
            Ok(self.live.clone())
        }
        async fn count_questions(&self) -> StoreResult<i64> {
            Err(StoreError::NotFound)
        }
        async fn questions_in_category(&self, _category_id: i64) -> StoreResult<Vec<Question>> {
            Err(StoreError::NotFound)
        }
        async fn question_ids(&self, _category_id: Option<i64>) -> StoreResult<Vec<i64>> {
            Ok(self.ids.clone())
        }
        async fn find_question(&self, id: i64) -> StoreResult<Option<Question>> {
            Ok(self.live.iter().find(|q| q.id == id).cloned())
        }
        async fn insert_question(&self, _new: &NewQuestion) -> StoreResult<i64> {
            Err(StoreError::NotFound)
        }
        async fn delete_question(&self, _id: i64) -> StoreResult<()> {
            Err(StoreError::NotFound)
        }
        async fn list_categories(&self) -> StoreResult<Vec<Category>> {
            Err(StoreError::NotFound)
        }
        async fn find_category(&self, _id: i64) -> StoreResult<Option<Category>> {
            Err(StoreError::NotFound)
        }
        async fn insert_category(&self, _kind: &str) -> StoreResult<Category> {
            Err(StoreError::NotFound)
        }
    }

    fn question(id: i64) -> Question {
        Question {
            id,
            question: format!("question {id}"),
            answer: "answer".to_string(),
            category: 1,
            difficulty: "1".to_string(),
        }
    }

    #[test]
    fn zero_and_missing_category_mean_all() {
        assert_eq!(category_filter(None), None);
        assert_eq!(category_filter(Some(0)), None);
        assert_eq!(category_filter(Some(3)), Some(3));
    }

    #[test]
    fn never_returns_excluded_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = vec![1, 2, 3, 4, 5];
        let exclude: HashSet<i64> = [1, 3, 5].into_iter().collect();
        for _ in 0..200 {
            let id = pick(&candidates, &exclude, &mut rng).unwrap();
            assert!(id == 2 || id == 4);
        }
    }

    #[test]
    fn exhausted_pool_yields_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let exclude: HashSet<i64> = [1, 2].into_iter().collect();
        assert_eq!(pick(&[1, 2], &exclude, &mut rng), None);
        assert_eq!(pick(&[], &HashSet::new(), &mut rng), None);
    }

    #[test]
    fn tolerates_foreign_ids_in_exclusion() {
        let mut rng = StdRng::seed_from_u64(1);
        let exclude: HashSet<i64> = [100, 200].into_iter().collect();
        assert_eq!(pick(&[9], &exclude, &mut rng), Some(9));
    }

    #[test]
    fn same_seed_same_sequence() {
        let candidates: Vec<i64> = (1..=50).collect();
        let none = HashSet::new();
        let mut a = rng_from_seed(Some(42));
        let mut b = rng_from_seed(Some(42));
        let run_a: Vec<_> = (0..20).map(|_| pick(&candidates, &none, &mut a)).collect();
        let run_b: Vec<_> = (0..20).map(|_| pick(&candidates, &none, &mut b)).collect();
        assert_eq!(run_a, run_b);
    }

    #[test]
    fn draws_cover_every_candidate() {
        let mut rng = StdRng::seed_from_u64(3);
        let candidates = vec![10, 20, 30];
        let none = HashSet::new();
        let seen: HashSet<i64> = (0..300)
            .filter_map(|_| pick(&candidates, &none, &mut rng))
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn vanished_draws_fall_through_to_live_questions() {
        let store = StaleIds {
            ids: vec![1, 2, 3, 4],
            live: vec![question(3)],
        };
        for seed in 0..20 {
            let rng = Mutex::new(StdRng::seed_from_u64(seed));
            let drawn = next_question(&store, None, &[], &rng).await.unwrap();
            assert_eq!(drawn.map(|q| q.id), Some(3));
        }
    }

    #[tokio::test]
    async fn only_vanished_candidates_is_exhausted() {
        let store = StaleIds {
            ids: vec![1, 2],
            live: vec![question(3)],
        };
        let rng = Mutex::new(StdRng::seed_from_u64(5));
        assert!(next_question(&store, None, &[], &rng).await.unwrap().is_none());
    }
}

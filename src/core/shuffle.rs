use crate::domain::model::{Deck, ShuffleMethod};
use crate::domain::ports::EntropySource;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Orders a deck with remote entropy, falling back to a local shuffle on any failure.
pub struct ShuffleEngine<E: EntropySource, R: Rng + Send = StdRng> {
    source: E,
    rng: Mutex<R>,
}

impl<E: EntropySource> ShuffleEngine<E, StdRng> {
    pub fn new(source: E) -> Self {
        Self::with_rng(source, StdRng::from_entropy())
    }
}

impl<E: EntropySource, R: Rng + Send> ShuffleEngine<E, R> {
    pub fn with_rng(source: E, rng: R) -> Self {
        Self {
            source,
            rng: Mutex::new(rng),
        }
    }

    pub fn source(&self) -> &E {
        &self.source
    }

    pub async fn shuffle(&self, deck: Deck) -> Deck {
        self.shuffle_with_method(deck).await.0
    }

    /// Never fails: the output is always a permutation of `deck`.
    pub async fn shuffle_with_method(&self, deck: Deck) -> (Deck, ShuffleMethod) {
        let requested = deck.len();
        if requested == 0 {
            return (deck, ShuffleMethod::Fallback);
        }

        match self.source.fetch_entropy(requested).await {
            Ok(values) if values.len() >= requested => {
                tracing::debug!("Ordering {} cards by remote entropy", requested);
                (order_by_entropy(deck, &values), ShuffleMethod::Quantum)
            }
            Ok(values) => {
                tracing::warn!(
                    "True random returned {} of {} values, falling back to pseudo-random",
                    values.len(),
                    requested
                );
                (self.fallback(deck), ShuffleMethod::Fallback)
            }
            Err(e) => {
                tracing::warn!("True random failed, falling back to pseudo-random: {}", e);
                (self.fallback(deck), ShuffleMethod::Fallback)
            }
        }
    }

    fn fallback(&self, deck: Deck) -> Deck {
        // 鎖中毒時 RNG 狀態仍可用
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        fisher_yates(deck, &mut *rng)
    }
}

/// Unbiased in-place shuffle: walks from the last index down to 1,
/// swapping with a uniform index in `[0, i]`.
pub fn fisher_yates<R: Rng + ?Sized>(deck: Deck, rng: &mut R) -> Deck {
    let mut cards = deck.into_cards();
    cards.shuffle(rng);
    Deck::new(cards)
}

/// Pairs each card with the value at its original index and stable-sorts ascending.
/// Ties keep original relative order. `values` must cover every card.
fn order_by_entropy(deck: Deck, values: &[u32]) -> Deck {
    let mut paired: Vec<_> = values.iter().copied().zip(deck.into_cards()).collect();
    paired.sort_by_key(|(value, _)| *value);
    Deck::new(paired.into_iter().map(|(_, card)| card).collect())
}

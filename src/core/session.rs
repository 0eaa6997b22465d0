use crate::domain::model::{
    Card, Deck, DrawnCard, Orientation, SessionEvent, SessionSnapshot, SessionStatus,
    ShuffleMethod,
};
use crate::utils::error::{SessionError, ValidationError};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MIN_DRAW_COUNT: usize = 1;
pub const MAX_DRAW_COUNT: usize = 10;

/// Checks start parameters without touching any session.
pub fn validate_start(question: &str, target_count: usize) -> Result<(), ValidationError> {
    if question.trim().is_empty() {
        return Err(ValidationError::InvalidQuestion);
    }
    if !(MIN_DRAW_COUNT..=MAX_DRAW_COUNT).contains(&target_count) {
        return Err(ValidationError::InvalidCount {
            count: target_count,
            min: MIN_DRAW_COUNT,
            max: MAX_DRAW_COUNT,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct Reading {
    question: String,
    target_count: usize,
    deck: Deck,
    drawn: Vec<DrawnCard>,
    started_at: DateTime<Utc>,
    shuffle_method: Option<ShuffleMethod>,
}

#[derive(Debug, Clone)]
enum SessionState {
    Idle,
    Active(Reading),
    Complete(Reading),
}

/// Single owned draw session: Idle -> Active -> Complete, back to Idle on reset.
///
/// The orientation coin flip uses `R`, so tests can seed it.
#[derive(Debug)]
pub struct DrawSession<R: Rng = StdRng> {
    state: SessionState,
    rng: R,
    events: Vec<SessionEvent>,
}

impl DrawSession<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for DrawSession<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DrawSession<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            state: SessionState::Idle,
            rng,
            events: Vec::new(),
        }
    }

    /// Validates the inputs and starts a fresh session over `deck`.
    /// A failed validation leaves the current state untouched.
    pub fn start(
        &mut self,
        question: &str,
        target_count: usize,
        deck: Deck,
    ) -> Result<(), ValidationError> {
        self.begin(question, target_count, deck, None)
    }

    pub fn start_with_method(
        &mut self,
        question: &str,
        target_count: usize,
        deck: Deck,
        method: ShuffleMethod,
    ) -> Result<(), ValidationError> {
        self.begin(question, target_count, deck, Some(method))
    }

    fn begin(
        &mut self,
        question: &str,
        target_count: usize,
        deck: Deck,
        shuffle_method: Option<ShuffleMethod>,
    ) -> Result<(), ValidationError> {
        validate_start(question, target_count)?;
        let question = question.trim();

        if self.status() != SessionStatus::Idle {
            tracing::debug!("Discarding previous session before starting a new one");
        }

        self.events.clear();
        self.state = SessionState::Active(Reading {
            question: question.to_string(),
            target_count,
            deck,
            drawn: Vec::with_capacity(target_count),
            started_at: Utc::now(),
            shuffle_method,
        });

        tracing::info!("Session started: drawing {} cards", target_count);
        Ok(())
    }

    /// Draws the card with `card_id` from the session deck and assigns its orientation.
    /// Failures leave the session untouched.
    pub fn draw_card(&mut self, card_id: &str) -> Result<DrawnCard, SessionError> {
        let status = self.status();
        let reading = match &mut self.state {
            SessionState::Active(reading) => reading,
            _ => return Err(SessionError::NotActive { status }),
        };

        if reading.drawn.iter().any(|drawn| drawn.card.id() == card_id) {
            return Err(SessionError::AlreadyDrawn {
                card_id: card_id.to_string(),
            });
        }

        let card = reading
            .deck
            .get(card_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownCard {
                card_id: card_id.to_string(),
            })?;

        let orientation = if self.rng.gen_bool(0.5) {
            Orientation::Reversed
        } else {
            Orientation::Upright
        };

        let drawn = DrawnCard {
            card,
            orientation,
            position: reading.drawn.len() + 1,
        };
        reading.drawn.push(drawn.clone());

        let drawn_count = reading.drawn.len();
        let target = reading.target_count;

        tracing::debug!(
            "Drew {} ({:?}), {}/{}",
            drawn.card.id(),
            orientation,
            drawn_count,
            target
        );
        self.events.push(SessionEvent::CardDrawn {
            card: drawn.clone(),
            drawn: drawn_count,
            target,
        });

        if drawn_count == target {
            if let SessionState::Active(reading) =
                std::mem::replace(&mut self.state, SessionState::Idle)
            {
                self.state = SessionState::Complete(reading);
            }
            self.events.push(SessionEvent::SessionComplete { drawn: drawn_count });
            tracing::info!("Session complete with {} cards", drawn_count);
        }

        Ok(drawn)
    }

    /// Discards everything and returns to Idle. Always succeeds.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.events.clear();
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Active(_) => SessionStatus::Active,
            SessionState::Complete(_) => SessionStatus::Complete,
        }
    }

    fn reading(&self) -> Option<&Reading> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Active(reading) | SessionState::Complete(reading) => Some(reading),
        }
    }

    pub fn question(&self) -> Option<&str> {
        self.reading().map(|reading| reading.question.as_str())
    }

    pub fn target_count(&self) -> Option<usize> {
        self.reading().map(|reading| reading.target_count)
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.reading().map(|reading| &reading.deck)
    }

    pub fn drawn_cards(&self) -> &[DrawnCard] {
        self.reading()
            .map(|reading| reading.drawn.as_slice())
            .unwrap_or(&[])
    }

    /// Cards not yet drawn, in shuffled order.
    pub fn remaining(&self) -> Vec<&Card> {
        match self.reading() {
            Some(reading) => reading
                .deck
                .iter()
                .filter(|card| !reading.drawn.iter().any(|d| d.card.id() == card.id()))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn shuffle_method(&self) -> Option<ShuffleMethod> {
        self.reading().and_then(|reading| reading.shuffle_method)
    }

    pub fn is_complete(&self) -> bool {
        self.status() == SessionStatus::Complete
    }

    /// Drains pending notifications in emission order.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            question: self.question().map(str::to_string),
            target_count: self.target_count(),
            drawn: self.drawn_cards().to_vec(),
            remaining: self
                .remaining()
                .into_iter()
                .map(|card| card.id().to_string())
                .collect(),
            started_at: self.reading().map(|reading| reading.started_at),
            shuffle_method: self.shuffle_method(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deck::DeckFactory;

    fn seeded() -> DrawSession<StdRng> {
        DrawSession::with_rng(StdRng::seed_from_u64(7))
    }

    fn first_ids(session: &DrawSession<StdRng>, n: usize) -> Vec<String> {
        session
            .deck()
            .unwrap()
            .iter()
            .take(n)
            .map(|card| card.id().to_string())
            .collect()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = seeded();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.question().is_none());
        assert!(session.drawn_cards().is_empty());
    }

    #[test]
    fn test_start_activates_for_every_valid_count() {
        for count in MIN_DRAW_COUNT..=MAX_DRAW_COUNT {
            let mut session = seeded();
            session
                .start("What is my path?", count, DeckFactory::build())
                .unwrap();

            assert_eq!(session.status(), SessionStatus::Active);
            assert_eq!(session.target_count(), Some(count));
            assert!(session.drawn_cards().is_empty());
            assert!(session.deck().unwrap().is_permutation_of(&DeckFactory::build()));
        }
    }

    #[test]
    fn test_start_rejects_empty_question() {
        let mut session = seeded();
        assert_eq!(
            session.start("", 3, DeckFactory::build()),
            Err(ValidationError::InvalidQuestion)
        );
        assert_eq!(
            session.start("   \t\n", 3, DeckFactory::build()),
            Err(ValidationError::InvalidQuestion)
        );
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_start_rejects_out_of_range_count() {
        let mut session = seeded();
        assert!(matches!(
            session.start("Q", 11, DeckFactory::build()),
            Err(ValidationError::InvalidCount { count: 11, .. })
        ));
        assert!(matches!(
            session.start("Q", 0, DeckFactory::build()),
            Err(ValidationError::InvalidCount { count: 0, .. })
        ));
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_failed_start_keeps_running_session() {
        let mut session = seeded();
        session.start("First", 2, DeckFactory::build()).unwrap();
        let id = first_ids(&session, 1).remove(0);
        session.draw_card(&id).unwrap();

        assert!(session.start("", 2, DeckFactory::build()).is_err());
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.question(), Some("First"));
        assert_eq!(session.drawn_cards().len(), 1);
    }

    #[test]
    fn test_question_is_trimmed() {
        let mut session = seeded();
        session.start("  Will it rain?  ", 1, DeckFactory::build()).unwrap();
        assert_eq!(session.question(), Some("Will it rain?"));
    }

    #[test]
    fn test_three_card_reading_completes() {
        let mut session = seeded();
        session.start("What is my path?", 3, DeckFactory::build()).unwrap();
        let ids = first_ids(&session, 3);

        session.draw_card(&ids[0]).unwrap();
        session.draw_card(&ids[1]).unwrap();
        assert_eq!(session.status(), SessionStatus::Active);

        let last = session.draw_card(&ids[2]).unwrap();
        assert_eq!(last.position, 3);
        assert_eq!(session.status(), SessionStatus::Complete);
        assert_eq!(session.drawn_cards().len(), 3);
        for drawn in session.drawn_cards() {
            assert!(matches!(
                drawn.orientation,
                Orientation::Upright | Orientation::Reversed
            ));
        }
        assert_eq!(session.remaining().len(), 75);
    }

    #[test]
    fn test_drawing_same_card_twice_is_rejected() {
        let mut session = seeded();
        session.start("Q", 3, DeckFactory::build()).unwrap();
        let id = first_ids(&session, 1).remove(0);

        let first = session.draw_card(&id).unwrap();
        let before = session.snapshot();

        assert_eq!(
            session.draw_card(&id),
            Err(SessionError::AlreadyDrawn { card_id: id.clone() })
        );
        let after = session.snapshot();
        assert_eq!(after.drawn, before.drawn);
        assert_eq!(after.drawn[0], first);
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_draw_when_idle_or_complete_is_not_active() {
        let mut session = seeded();
        assert_eq!(
            session.draw_card("major-0"),
            Err(SessionError::NotActive {
                status: SessionStatus::Idle
            })
        );

        session.start("Q", 1, DeckFactory::build()).unwrap();
        let ids = first_ids(&session, 2);
        session.draw_card(&ids[0]).unwrap();

        assert_eq!(
            session.draw_card(&ids[1]),
            Err(SessionError::NotActive {
                status: SessionStatus::Complete
            })
        );
        assert_eq!(session.drawn_cards().len(), 1);
    }

    #[test]
    fn test_unknown_card_is_rejected() {
        let mut session = seeded();
        session.start("Q", 2, DeckFactory::build()).unwrap();

        assert_eq!(
            session.draw_card("major-99"),
            Err(SessionError::UnknownCard {
                card_id: "major-99".to_string()
            })
        );
        assert!(session.drawn_cards().is_empty());
    }

    #[test]
    fn test_events_follow_draws() {
        let mut session = seeded();
        session.start("Q", 2, DeckFactory::build()).unwrap();
        let ids = first_ids(&session, 2);

        session.draw_card(&ids[0]).unwrap();
        let events = session.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SessionEvent::CardDrawn {
                drawn: 1,
                target: 2,
                ..
            }
        ));
        assert!(session.take_events().is_empty());

        session.draw_card(&ids[1]).unwrap();
        let events = session.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], SessionEvent::SessionComplete { drawn: 2 });
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut session = seeded();
        session.reset();
        assert_eq!(session.status(), SessionStatus::Idle);

        session.start("Q", 2, DeckFactory::build()).unwrap();
        session.reset();
        assert_eq!(session.status(), SessionStatus::Idle);

        session.start("Q", 1, DeckFactory::build()).unwrap();
        let id = first_ids(&session, 1).remove(0);
        session.draw_card(&id).unwrap();
        session.reset();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert!(snapshot.question.is_none());
        assert!(snapshot.drawn.is_empty());
        assert!(snapshot.remaining.is_empty());
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_orientation_is_roughly_fair() {
        let mut session = seeded();
        let mut reversed = 0;
        let rounds = 200;

        for _ in 0..rounds {
            session.start("Q", 10, DeckFactory::build()).unwrap();
            for id in first_ids(&session, 10) {
                if session.draw_card(&id).unwrap().is_reversed() {
                    reversed += 1;
                }
            }
        }

        // 2000 flips, expected 1000
        assert!((850..=1150).contains(&reversed), "reversed {} times", reversed);
    }

    #[test]
    fn test_snapshot_records_shuffle_method() {
        let mut session = seeded();
        session
            .start_with_method("Q", 3, DeckFactory::build(), ShuffleMethod::Quantum)
            .unwrap();
        let snapshot = session.snapshot();

        assert_eq!(snapshot.shuffle_method, Some(ShuffleMethod::Quantum));
        assert_eq!(snapshot.remaining.len(), 78);
        assert!(snapshot.started_at.is_some());
    }
}

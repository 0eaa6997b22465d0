use crate::core::deck::{DeckFactory, DECK_SIZE};
use crate::core::session::{validate_start, DrawSession};
use crate::core::shuffle::ShuffleEngine;
use crate::domain::model::{DrawnCard, Locale, SessionEvent, SessionSnapshot};
use crate::domain::ports::{ChatCompletion, EntropySource, InterpretationRequest, Interpreter};
use crate::utils::error::{EntropyError, Result, TarotError};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
pub struct DrawOutcome {
    pub card: DrawnCard,
    pub events: Vec<SessionEvent>,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterpretationOutcome {
    pub prompt: String,
    pub content: String,
}

/// Owns the single draw session and the collaborators that feed it.
/// Commands are serialized through the session lock.
pub struct TarotEngine<E: EntropySource, I: Interpreter> {
    shuffler: ShuffleEngine<E>,
    interpreter: I,
    session: Mutex<DrawSession>,
    locale: Locale,
}

impl<E: EntropySource, I: Interpreter> TarotEngine<E, I> {
    pub fn new(source: E, interpreter: I, locale: Locale) -> Self {
        Self::with_parts(
            ShuffleEngine::new(source),
            DrawSession::new(),
            interpreter,
            locale,
        )
    }

    pub fn with_parts(
        shuffler: ShuffleEngine<E>,
        session: DrawSession,
        interpreter: I,
        locale: Locale,
    ) -> Self {
        Self {
            shuffler,
            interpreter,
            session: Mutex::new(session),
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Validates, shuffles a fresh deck and starts the session.
    pub async fn start(&self, question: &str, count: usize) -> Result<SessionSnapshot> {
        // 先驗證，避免無效請求也去呼叫量子亂數服務
        validate_start(question, count)?;

        let (deck, method) = self
            .shuffler
            .shuffle_with_method(DeckFactory::build())
            .await;
        tracing::info!("Deck shuffled using {:?} entropy", method);

        let mut session = self.session.lock().await;
        session.start_with_method(question, count, deck, method)?;
        Ok(session.snapshot())
    }

    pub async fn draw(&self, card_id: &str) -> Result<DrawOutcome> {
        let mut session = self.session.lock().await;
        let card = session.draw_card(card_id)?;
        Ok(DrawOutcome {
            card,
            events: session.take_events(),
            snapshot: session.snapshot(),
        })
    }

    pub async fn reset(&self) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        session.reset();
        tracing::info!("Session reset");
        session.snapshot()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Interprets the completed session. On failure the session is left as is
    /// so the reading is not lost.
    pub async fn interpret_session(&self) -> Result<InterpretationOutcome> {
        let request = {
            let session = self.session.lock().await;
            InterpretationRequest::from_session(&*session, self.locale)?
        };

        let completion = self.interpret(&request).await?;
        let content = completion
            .content()
            .map(str::to_string)
            .ok_or_else(|| TarotError::Interpretation {
                message: "response contained no choices".to_string(),
            })?;

        Ok(InterpretationOutcome {
            prompt: request.prompt,
            content,
        })
    }

    /// Forwards an arbitrary prompt to the interpretation provider.
    pub async fn interpret(&self, request: &InterpretationRequest) -> Result<ChatCompletion> {
        tracing::debug!("Requesting interpretation ({} chars)", request.prompt.len());
        self.interpreter.interpret(request).await.map_err(|e| {
            tracing::error!("Interpretation failed: {}", e);
            e
        })
    }

    /// Raw entropy for one full deck, as served by `/api/random`.
    pub async fn random(&self) -> std::result::Result<Vec<u32>, EntropyError> {
        self.shuffler.source().fetch_entropy(DECK_SIZE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{SessionStatus, ShuffleMethod};
    use crate::domain::ports::{ChatChoice, ChatMessage};
    use crate::utils::error::{SessionError, ValidationError};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EntropySource for CountingSource {
        async fn fetch_entropy(&self, n: usize) -> std::result::Result<Vec<u32>, EntropyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..n as u32).rev().collect())
        }
    }

    struct EchoInterpreter {
        fail: bool,
    }

    #[async_trait]
    impl Interpreter for EchoInterpreter {
        async fn interpret(&self, request: &InterpretationRequest) -> Result<ChatCompletion> {
            if self.fail {
                return Err(TarotError::Interpretation {
                    message: "API Error: 500 - upstream down".to_string(),
                });
            }
            Ok(ChatCompletion {
                choices: vec![ChatChoice {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: format!("**Reading** for {} chars", request.prompt.len()),
                    },
                    extra: HashMap::new(),
                }],
                extra: HashMap::new(),
            })
        }
    }

    fn engine(fail: bool) -> TarotEngine<Arc<CountingSource>, EchoInterpreter> {
        TarotEngine::with_parts(
            ShuffleEngine::new(Arc::new(CountingSource::default())),
            DrawSession::with_rng(StdRng::seed_from_u64(3)),
            EchoInterpreter { fail },
            Locale::En,
        )
    }

    async fn complete_reading(
        engine: &TarotEngine<Arc<CountingSource>, EchoInterpreter>,
        count: usize,
    ) {
        let snapshot = engine.start("What is my path?", count).await.unwrap();
        for id in snapshot.remaining.iter().take(count) {
            engine.draw(id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_start_uses_quantum_order() {
        let engine = engine(false);
        let snapshot = engine.start("What is my path?", 3).await.unwrap();

        assert_eq!(snapshot.status, SessionStatus::Active);
        assert_eq!(snapshot.shuffle_method, Some(ShuffleMethod::Quantum));
        // 值由大到小遞減，排序後整副牌反轉
        assert_eq!(snapshot.remaining.first().unwrap(), "minor-pentacles-13");
        assert_eq!(snapshot.remaining.last().unwrap(), "major-0");
    }

    #[tokio::test]
    async fn test_invalid_start_skips_entropy_provider() {
        let engine = engine(false);

        let err = engine.start("", 3).await.unwrap_err();
        assert!(matches!(
            err,
            TarotError::Validation(ValidationError::InvalidQuestion)
        ));
        let err = engine.start("Q", 11).await.unwrap_err();
        assert!(matches!(
            err,
            TarotError::Validation(ValidationError::InvalidCount { .. })
        ));

        assert_eq!(engine.shuffler.source().calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.snapshot().await.status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_draw_reports_events_and_completion() {
        let engine = engine(false);
        let snapshot = engine.start("Q", 2).await.unwrap();

        let first = engine.draw(&snapshot.remaining[0]).await.unwrap();
        assert_eq!(first.card.position, 1);
        assert_eq!(first.events.len(), 1);
        assert_eq!(first.snapshot.status, SessionStatus::Active);

        let second = engine.draw(&snapshot.remaining[1]).await.unwrap();
        assert_eq!(second.events.len(), 2);
        assert_eq!(second.snapshot.status, SessionStatus::Complete);
    }

    #[tokio::test]
    async fn test_interpret_requires_complete_session() {
        let engine = engine(false);
        engine.start("Q", 2).await.unwrap();

        let err = engine.interpret_session().await.unwrap_err();
        assert!(matches!(
            err,
            TarotError::Session(SessionError::Incomplete { drawn: 0, target: 2 })
        ));
    }

    #[tokio::test]
    async fn test_interpret_session_returns_content() {
        let engine = engine(false);
        complete_reading(&engine, 3).await;

        let outcome = engine.interpret_session().await.unwrap();
        assert!(outcome.prompt.contains("What is my path?"));
        assert!(outcome.content.starts_with("**Reading**"));
    }

    #[tokio::test]
    async fn test_interpretation_failure_preserves_session() {
        let engine = engine(true);
        complete_reading(&engine, 2).await;

        let err = engine.interpret_session().await.unwrap_err();
        assert!(matches!(err, TarotError::Interpretation { .. }));

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.status, SessionStatus::Complete);
        assert_eq!(snapshot.drawn.len(), 2);
        assert_eq!(snapshot.question.as_deref(), Some("What is my path?"));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let engine = engine(false);
        complete_reading(&engine, 1).await;

        let snapshot = engine.reset().await;
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert!(snapshot.drawn.is_empty());
    }

    #[tokio::test]
    async fn test_random_requests_full_deck() {
        let engine = engine(false);
        let values = engine.random().await.unwrap();
        assert_eq!(values.len(), 78);
    }
}

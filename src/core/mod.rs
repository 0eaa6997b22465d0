pub mod deck;
pub mod engine;
pub mod prompt;
pub mod session;
pub mod shuffle;

pub use crate::domain::model::{Card, Deck, DrawnCard, Orientation, SessionStatus};
pub use crate::domain::ports::{EntropySource, Interpreter};
pub use crate::utils::error::Result;

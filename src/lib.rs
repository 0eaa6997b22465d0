pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{entropy::QrngSource, llm::ChatCompletionClient, web::WebApp};
pub use config::toml_config::TarotConfig;
pub use crate::core::{
    deck::DeckFactory, engine::TarotEngine, session::DrawSession, shuffle::ShuffleEngine,
};
pub use utils::error::{Result, TarotError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arcana {
    Major,
    Minor,
}

impl Arcana {
    pub fn label(&self) -> &'static str {
        match self {
            Arcana::Major => "大阿卡纳",
            Arcana::Minor => "小阿卡纳",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Wands,
    Cups,
    Swords,
    Pentacles,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Wands, Suit::Cups, Suit::Swords, Suit::Pentacles];

    /// Stable identifier fragment used in card ids.
    pub fn slug(&self) -> &'static str {
        match self {
            Suit::Wands => "wands",
            Suit::Cups => "cups",
            Suit::Swords => "swords",
            Suit::Pentacles => "pentacles",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Suit::Wands => "权杖 (Wands)",
            Suit::Cups => "圣杯 (Cups)",
            Suit::Swords => "宝剑 (Swords)",
            Suit::Pentacles => "星币 (Pentacles)",
        }
    }
}

/// A single tarot card. Immutable once built by the deck factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    id: String,
    name: String,
    arcana: Arcana,
    #[serde(skip_serializing_if = "Option::is_none")]
    suit: Option<Suit>,
}

impl Card {
    pub fn major(index: usize, name: &str) -> Self {
        Self {
            id: format!("major-{}", index),
            name: name.to_string(),
            arcana: Arcana::Major,
            suit: None,
        }
    }

    pub fn minor(suit: Suit, rank_index: usize, rank_name: &str) -> Self {
        Self {
            id: format!("minor-{}-{}", suit.slug(), rank_index),
            name: format!("{} - {}", suit.display_name(), rank_name),
            arcana: Arcana::Minor,
            suit: Some(suit),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arcana(&self) -> Arcana {
        self.arcana
    }

    pub fn suit(&self) -> Option<Suit> {
        self.suit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Orientation::Upright, Locale::Zh) => "正位",
            (Orientation::Reversed, Locale::Zh) => "逆位",
            (Orientation::Upright, Locale::En) => "Upright",
            (Orientation::Reversed, Locale::En) => "Reversed",
        }
    }
}

/// 抽出的牌：方向在抽牌當下決定，之後不再改變
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    pub card: Card,
    pub orientation: Orientation,
    /// 1-based position in draw order.
    pub position: usize,
}

impl DrawnCard {
    pub fn is_reversed(&self) -> bool {
        self.orientation == Orientation::Reversed
    }
}

/// Ordered sequence of cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn get(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id() == card_id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.cards.iter().map(|card| card.id().to_string()).collect()
    }

    pub fn count(&self, arcana: Arcana) -> usize {
        self.cards.iter().filter(|card| card.arcana() == arcana).count()
    }

    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.cards.len());
        self.cards.iter().all(|card| seen.insert(card.id()))
    }

    /// Same length and same multiset of ids, in any order.
    pub fn is_permutation_of(&self, other: &Deck) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut left = self.ids();
        let mut right = other.ids();
        left.sort();
        right.sort();
        left == right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Complete,
}

/// Which path produced a shuffled deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMethod {
    Quantum,
    Fallback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

/// Notification emitted by a draw session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    CardDrawn { card: DrawnCard, drawn: usize, target: usize },
    SessionComplete { drawn: usize },
}

/// Serializable view of a session for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub question: Option<String>,
    pub target_count: Option<usize>,
    pub drawn: Vec<DrawnCard>,
    /// Ids of cards still face down, in shuffled order.
    pub remaining: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub shuffle_method: Option<ShuffleMethod>,
}

use crate::domain::model::{Card, Deck, Suit};

pub const MAJOR_ARCANA: [&str; 22] = [
    "愚者 (The Fool)",
    "魔术师 (The Magician)",
    "女祭司 (The High Priestess)",
    "皇后 (The Empress)",
    "皇帝 (The Emperor)",
    "教皇 (The Hierophant)",
    "恋人 (The Lovers)",
    "战车 (The Chariot)",
    "力量 (Strength)",
    "隐士 (The Hermit)",
    "命运之轮 (Wheel of Fortune)",
    "正义 (Justice)",
    "倒吊人 (The Hanged Man)",
    "死神 (Death)",
    "节制 (Temperance)",
    "恶魔 (The Devil)",
    "高塔 (The Tower)",
    "星星 (The Star)",
    "月亮 (The Moon)",
    "太阳 (The Sun)",
    "审判 (Judgement)",
    "世界 (The World)",
];

pub const RANKS: [&str; 14] = [
    "王牌 (Ace)",
    "2",
    "3",
    "4",
    "5",
    "6",
    "7",
    "8",
    "9",
    "10",
    "侍从 (Page)",
    "骑士 (Knight)",
    "王后 (Queen)",
    "国王 (King)",
];

pub const DECK_SIZE: usize = MAJOR_ARCANA.len() + Suit::ALL.len() * RANKS.len();

pub struct DeckFactory;

impl DeckFactory {
    /// Builds the canonical 78-card deck: major arcana first, then each suit in rank order.
    pub fn build() -> Deck {
        let mut cards = Vec::with_capacity(DECK_SIZE);

        for (index, name) in MAJOR_ARCANA.iter().enumerate() {
            cards.push(Card::major(index, name));
        }

        for suit in Suit::ALL {
            for (rank_index, rank) in RANKS.iter().enumerate() {
                cards.push(Card::minor(suit, rank_index, rank));
            }
        }

        Deck::new(cards)
    }
}

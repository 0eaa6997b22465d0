use crate::domain::model::{DrawnCard, Locale};
use crate::domain::ports::InterpretationRequest;
use crate::utils::error::SessionError;
use rand::Rng;

use super::session::DrawSession;

/// One line per card in draw order: `"<position>. <name> (<orientation>)"`.
pub fn describe_cards(drawn: &[DrawnCard], locale: Locale) -> String {
    drawn
        .iter()
        .map(|d| format!("{}. {} ({})", d.position, d.card.name(), d.orientation.label(locale)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(question: &str, drawn: &[DrawnCard], locale: Locale) -> String {
    let cards = describe_cards(drawn, locale);
    match locale {
        Locale::Zh => format!(
            "你是一位神秘而智慧的塔罗牌占卜师。\n\
             用户的问题是：{question}\n\
             用户抽到的牌是：\n\
             {cards}\n\n\
             请根据用户的问题和抽到的牌，进行详细的解读。\n\
             解读风格应该是神秘、富有启发性且温暖的。\n\
             请使用Markdown格式输出，可以使用加粗、列表、标题等格式来组织内容，使其易于阅读。"
        ),
        Locale::En => format!(
            "You are a mysterious and wise tarot reader.\n\
             The querent asks: {question}\n\
             The cards drawn are:\n\
             {cards}\n\n\
             Give a detailed reading that relates the cards to the question.\n\
             Keep the tone mysterious, insightful and warm.\n\
             Answer in Markdown, using headings, bold text and lists where they help."
        ),
    }
}

impl InterpretationRequest {
    /// Builds the provider request from a finished session.
    pub fn from_session<R: Rng>(
        session: &DrawSession<R>,
        locale: Locale,
    ) -> Result<Self, SessionError> {
        let drawn = session.drawn_cards();
        match (session.is_complete(), session.question()) {
            (true, Some(question)) => Ok(Self {
                prompt: build_prompt(question, drawn, locale),
            }),
            _ => Err(SessionError::Incomplete {
                drawn: drawn.len(),
                target: session.target_count().unwrap_or(0),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deck::DeckFactory;
    use crate::domain::model::{Card, Orientation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn drawn(position: usize, index: usize, name: &str, orientation: Orientation) -> DrawnCard {
        DrawnCard {
            card: Card::major(index, name),
            orientation,
            position,
        }
    }

    #[test]
    fn test_describe_cards_in_draw_order() {
        let cards = vec![
            drawn(1, 16, "高塔 (The Tower)", Orientation::Reversed),
            drawn(2, 0, "愚者 (The Fool)", Orientation::Upright),
        ];

        assert_eq!(
            describe_cards(&cards, Locale::Zh),
            "1. 高塔 (The Tower) (逆位)\n2. 愚者 (The Fool) (正位)"
        );
        assert_eq!(
            describe_cards(&cards, Locale::En),
            "1. 高塔 (The Tower) (Reversed)\n2. 愚者 (The Fool) (Upright)"
        );
    }

    #[test]
    fn test_prompt_contains_question_and_cards() {
        let cards = vec![drawn(1, 19, "太阳 (The Sun)", Orientation::Upright)];
        let prompt = build_prompt("What is my path?", &cards, Locale::En);

        assert!(prompt.contains("The querent asks: What is my path?"));
        assert!(prompt.contains("1. 太阳 (The Sun) (Upright)"));
        assert!(prompt.contains("Markdown"));
    }

    #[test]
    fn test_from_session_requires_completion() {
        let mut session = DrawSession::with_rng(StdRng::seed_from_u64(1));
        assert_eq!(
            InterpretationRequest::from_session(&session, Locale::Zh),
            Err(SessionError::Incomplete { drawn: 0, target: 0 })
        );

        session.start("我的事业如何？", 2, DeckFactory::build()).unwrap();
        let ids: Vec<String> = session.deck().unwrap().ids().into_iter().take(2).collect();
        session.draw_card(&ids[0]).unwrap();
        assert_eq!(
            InterpretationRequest::from_session(&session, Locale::Zh),
            Err(SessionError::Incomplete { drawn: 1, target: 2 })
        );

        session.draw_card(&ids[1]).unwrap();
        let request = InterpretationRequest::from_session(&session, Locale::Zh).unwrap();
        assert!(request.prompt.contains("用户的问题是：我的事业如何？"));
        assert!(request.prompt.contains(&describe_cards(session.drawn_cards(), Locale::Zh)));
    }
}

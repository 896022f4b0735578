//! Hand representation shared by the player and the dealer.

use crate::card::Card;

/// Placeholder shown for a hand that has not been dealt yet.
pub const NO_CARDS: &str = "(no cards dealt)";

/// Placeholder shown in place of the dealer's hole card.
pub const HIDDEN_CARD: &str = "[Hidden]";

fn evaluate_cards(cards: &[Card]) -> (u8, bool) {
    let mut value: u8 = 0;
    let mut aces: u8 = 0;

    for card in cards {
        if card.is_ace() {
            aces += 1;
        }
        value = value.saturating_add(card.value());
    }

    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }

    let is_soft = aces > 0 && value <= 21;
    (value, is_soft)
}

/// An ordered, append-only collection of cards held by one party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    /// Creates a new empty hand.
    #[must_use]
    pub const fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// Adds a card to the hand.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Returns the cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the visible card (first card).
    #[must_use]
    pub fn up_card(&self) -> Option<&Card> {
        self.cards.first()
    }

    /// Calculates the value of the hand.
    ///
    /// Aces start at 11 and are demoted to 1, one at a time, while the total
    /// exceeds 21.
    #[must_use]
    pub fn value(&self) -> u8 {
        evaluate_cards(&self.cards).0
    }

    /// Returns whether the hand is soft (contains an ace counted as 11).
    #[must_use]
    pub fn is_soft(&self) -> bool {
        evaluate_cards(&self.cards).1
    }

    /// Returns whether the hand is over 21.
    #[must_use]
    pub fn is_busted(&self) -> bool {
        self.value() > 21
    }

    /// Returns whether the hand is a natural: exactly two cards worth 21.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value() == 21
    }

    /// Returns the number of cards in the hand.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Renders the cards as `[A♠] [10♥]`, in hand order.
    #[must_use]
    pub fn render(&self) -> String {
        if self.cards.is_empty() {
            return NO_CARDS.to_owned();
        }

        self.cards
            .iter()
            .map(|card| format!("[{card}]"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Renders only the first card followed by a hidden placeholder.
    #[must_use]
    pub fn render_hidden(&self) -> String {
        self.up_card().map_or_else(
            || NO_CARDS.to_owned(),
            |card| format!("[{card}] {HIDDEN_CARD}"),
        )
    }
}

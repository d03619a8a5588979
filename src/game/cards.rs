//! Cards, deck, and dice for the Coruscant Shift variant.
//!
//! Everything in this module is pure: deck composition, scoring, suit
//! counting, the tiebreaker card ordering, and the two dice. Game state
//! lives in [`super::entities::GameState`].

use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

use super::constants::DECK_SIZE;

/// The three suits. Wild cards carry no suit.
///
/// Declaration order doubles as the fixed tiebreaker order: a Square beats a
/// Triangle beats a Circle of the same value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Circle,
    Triangle,
    Square,
}

pub const SUITS: [Suit; 3] = [Suit::Circle, Suit::Triangle, Suit::Square];

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Circle => "●",
            Self::Triangle => "▲",
            Self::Square => "■",
        };
        write!(f, "{repr}")
    }
}

/// Card values: negative "red" cards, positive "green" cards, 0 for wilds.
pub type Value = i32;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub suit: Option<Suit>,
    pub value: Value,
    pub is_wild: bool,
}

impl Card {
    #[must_use]
    pub const fn new(value: Value, suit: Suit) -> Self {
        Self {
            suit: Some(suit),
            value,
            is_wild: false,
        }
    }

    /// One of the two wild zero cards.
    #[must_use]
    pub const fn wild() -> Self {
        Self {
            suit: None,
            value: 0,
            is_wild: true,
        }
    }

    /// Whether this card counts toward `suit`. Wild cards count toward
    /// every suit.
    #[must_use]
    pub fn counts_toward(&self, suit: Suit) -> bool {
        self.is_wild || self.suit == Some(suit)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self.suit {
            Some(suit) => format!("{:+}{suit}", self.value),
            None => "0w".to_string(),
        };
        write!(f, "{repr:>4}")
    }
}

/// The 62-card Coruscant Shift deck.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Deterministic pre-shuffle composition: per suit, the ten negative
    /// "red" values and the ten positive "green" values, plus the two wild
    /// zero cards.
    #[must_use]
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in SUITS {
            for value in -10..=-1 {
                cards.push(Card::new(value, suit));
            }
            for value in 1..=10 {
                cards.push(Card::new(value, suit));
            }
        }
        cards.push(Card::wild());
        cards.push(Card::wild());
        Self { cards }
    }

    /// Build a draw pile with a known order. The last card is drawn first.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Fisher-Yates shuffle over the remaining cards.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// Draw the top card, if any remain.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Draw up to `n` cards. Callers treat a short draw as deck exhaustion.
    pub fn draw_n(&mut self, n: usize) -> Vec<Card> {
        let start = self.cards.len().saturating_sub(n);
        self.cards.split_off(start)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// Gold die faces. Zero appears twice, doubling its weight.
const GOLD_DIE: [Value; 6] = [0, 0, 5, -5, 10, -10];

/// One roll of the gold (target number) and silver (preferred suit) dice.
/// Produced once per round; fixes the round's target and preferred suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiceRoll {
    pub gold_value: Value,
    pub silver_suit: Suit,
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target {:+}, suit {}", self.gold_value, self.silver_suit)
    }
}

/// Roll both dice.
#[must_use]
pub fn roll_dice() -> DiceRoll {
    let mut rng = rand::rng();
    DiceRoll {
        gold_value: *GOLD_DIE.choose(&mut rng).unwrap_or(&0),
        silver_suit: *SUITS.choose(&mut rng).unwrap_or(&Suit::Circle),
    }
}

/// Six-sided chance cube, the last-resort tiebreaker.
#[must_use]
pub fn roll_chance_cube() -> u8 {
    rand::rng().random_range(1..=6)
}

/// Round score: absolute distance between the selection sum and the target.
/// Lower is better; an empty selection scores `|target|`.
#[must_use]
pub fn calculate_score(selected: &[Card], target: Value) -> Value {
    let sum: Value = selected.iter().map(|card| card.value).sum();
    (sum - target).abs()
}

/// Count of cards matching the preferred suit. Wild cards always count.
#[must_use]
pub fn count_preferred_suit(selected: &[Card], suit: Suit) -> usize {
    selected
        .iter()
        .filter(|card| card.counts_toward(suit))
        .count()
}

/// Tiebreaker ordering for drawn cards: higher absolute value wins, a
/// positive value beats the equal negative one, and the fixed suit order
/// breaks what remains. Wilds sort below any suited card.
#[must_use]
pub fn compare_cards(a: &Card, b: &Card) -> Ordering {
    a.value
        .abs()
        .cmp(&b.value.abs())
        .then_with(|| (a.value > 0).cmp(&(b.value > 0)))
        .then_with(|| a.suit.cmp(&b.suit))
}

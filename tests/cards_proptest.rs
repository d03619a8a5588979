/// Property-based tests for deck math using proptest
///
/// These tests verify scoring, suit counting, and the tiebreaker card
/// ordering across a wide range of randomly generated selections.
use proptest::prelude::*;
use sabacc_engine::game::cards::{
    Card, Suit, calculate_score, compare_cards, count_preferred_suit,
};
use std::cmp::Ordering;

// Strategy to generate a suited card (values -10..=10, never 0)
fn suited_card_strategy() -> impl Strategy<Value = Card> {
    let value = prop_oneof![-10i32..=-1, 1i32..=10];
    let suit = prop_oneof![
        Just(Suit::Circle),
        Just(Suit::Triangle),
        Just(Suit::Square),
    ];
    (value, suit).prop_map(|(value, suit)| Card::new(value, suit))
}

// Strategy to generate any card, wilds included
fn card_strategy() -> impl Strategy<Value = Card> {
    prop_oneof![
        9 => suited_card_strategy(),
        1 => Just(Card::wild()),
    ]
}

fn selection_strategy() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), 0..=10)
}

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop_oneof![
        Just(Suit::Circle),
        Just(Suit::Triangle),
        Just(Suit::Square),
    ]
}

proptest! {
    #[test]
    fn test_score_is_distance_between_sum_and_target(
        cards in selection_strategy(),
        target in -10i32..=10,
    ) {
        let sum: i32 = cards.iter().map(|card| card.value).sum();
        prop_assert_eq!(calculate_score(&cards, target), (sum - target).abs());
    }

    #[test]
    fn test_empty_selection_scores_absolute_target(target in -10i32..=10) {
        prop_assert_eq!(calculate_score(&[], target), target.abs());
    }

    #[test]
    fn test_score_is_never_negative(
        cards in selection_strategy(),
        target in -10i32..=10,
    ) {
        prop_assert!(calculate_score(&cards, target) >= 0);
    }

    #[test]
    fn test_wild_cards_count_toward_every_suit(
        cards in selection_strategy(),
        suit in suit_strategy(),
    ) {
        let wilds = cards.iter().filter(|card| card.is_wild).count();
        let suited = cards
            .iter()
            .filter(|card| card.suit == Some(suit))
            .count();
        prop_assert_eq!(count_preferred_suit(&cards, suit), wilds + suited);
    }

    #[test]
    fn test_suit_count_never_exceeds_selection_size(
        cards in selection_strategy(),
        suit in suit_strategy(),
    ) {
        prop_assert!(count_preferred_suit(&cards, suit) <= cards.len());
    }

    #[test]
    fn test_compare_cards_is_antisymmetric(
        a in card_strategy(),
        b in card_strategy(),
    ) {
        prop_assert_eq!(compare_cards(&a, &b), compare_cards(&b, &a).reverse());
    }

    #[test]
    fn test_compare_cards_is_reflexive(card in card_strategy()) {
        prop_assert_eq!(compare_cards(&card, &card), Ordering::Equal);
    }

    #[test]
    fn test_distinct_suited_cards_never_tie(
        a in suited_card_strategy(),
        b in suited_card_strategy(),
    ) {
        // The deck holds one copy of every suited card, so the ordering
        // must fully separate distinct ones.
        if a != b {
            prop_assert_ne!(compare_cards(&a, &b), Ordering::Equal);
        }
    }

    #[test]
    fn test_higher_absolute_value_always_wins(
        a in suited_card_strategy(),
        b in suited_card_strategy(),
    ) {
        if a.value.abs() > b.value.abs() {
            prop_assert_eq!(compare_cards(&a, &b), Ordering::Greater);
        }
    }
}

//! Hi-Lo count arithmetic.
//!
//! Pure functions over the running count. The session machine owns the
//! state; everything here takes values in and hands new values back.

use crate::models::Card;

/// Cards in a standard deck.
pub const CARDS_PER_DECK: u32 = 52;

/// Running count after a single dealt card.
pub fn running_after_card(running: i32, card: Card) -> i32 {
    running + i32::from(card.count_value())
}

/// Running count after a sequence of dealt cards, applied in deal order.
///
/// A strict left fold over the whole slice; equivalent to repeated
/// [`running_after_card`] application.
pub fn running_after_cards(running: i32, cards: &[Card]) -> i32 {
    cards
        .iter()
        .fold(running, |acc, card| running_after_card(acc, *card))
}

/// Estimated decks left in the shoe. Fractional; callers decide rounding.
pub fn decks_remaining(cards_remaining: u32) -> f64 {
    f64::from(cards_remaining) / f64::from(CARDS_PER_DECK)
}

/// True count: running count normalised by estimated decks remaining.
///
/// The quotient is truncated toward zero, so `-7` over three decks is `-2`,
/// not `-3`. A depleted or unknown shoe depth (`decks_remaining <= 0`)
/// applies no normalisation and returns the running count unchanged.
pub fn true_count(running: i32, decks_remaining: f64) -> i32 {
    if decks_remaining <= 0.0 {
        return running;
    }
    (f64::from(running) / decks_remaining).trunc() as i32
}

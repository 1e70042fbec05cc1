#![allow(missing_docs)]

//! Shared domain models: cards, table rules, and training modes.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Card rank. Ordering follows deal-table convention, ace high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// All thirteen ranks in canonical order.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Hi-Lo tag for this rank: low cards +1, neutrals 0, tens and aces -1.
    ///
    /// Pure function of the rank; the card's suit never matters.
    pub fn count_value(self) -> i8 {
        match self {
            Rank::Two | Rank::Three | Rank::Four | Rank::Five | Rank::Six => 1,
            Rank::Seven | Rank::Eight | Rank::Nine => 0,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King | Rank::Ace => -1,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// All four suits.
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        }
    }
}

/// Immutable playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Face value, one of the thirteen ranks.
    pub rank: Rank,
    /// One of the four suits.
    pub suit: Suit,
}

impl Card {
    /// Construct a card from rank and suit.
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Hi-Lo tag derived from the rank.
    pub fn count_value(self) -> i8 {
        self.rank.count_value()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

/// Shoe size. Only the table formats the trainer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeckCount {
    /// Single-deck table.
    Single,
    /// Double-deck table.
    Double,
    /// Six-deck shoe.
    #[default]
    Six,
    /// Eight-deck shoe.
    Eight,
}

impl DeckCount {
    /// Number of decks in the shoe.
    pub fn decks(self) -> u32 {
        match self {
            DeckCount::Single => 1,
            DeckCount::Double => 2,
            DeckCount::Six => 6,
            DeckCount::Eight => 8,
        }
    }

    /// Total cards in a full shoe.
    pub fn cards(self) -> u32 {
        self.decks() * 52
    }

    /// Map a raw deck count from configuration to a supported shoe size.
    pub fn from_decks(decks: u32) -> Option<Self> {
        match decks {
            1 => Some(DeckCount::Single),
            2 => Some(DeckCount::Double),
            6 => Some(DeckCount::Six),
            8 => Some(DeckCount::Eight),
            _ => None,
        }
    }
}

/// Deal pacing setting. The core only carries the value; pacing itself is a
/// presentation concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DealSpeed {
    /// Relaxed pacing for beginners.
    Slow,
    /// Default pacing.
    #[default]
    Normal,
    /// Casino-speed dealing.
    Fast,
}

impl DealSpeed {
    /// Suggested delay between dealt cards.
    pub fn interval_ms(self) -> u64 {
        match self {
            DealSpeed::Slow => 1500,
            DealSpeed::Normal => 900,
            DealSpeed::Fast => 450,
        }
    }
}

/// When a count-verification prompt becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CountCheckPolicy {
    /// Never prompt for a count check.
    Never,
    /// Prompt after every N resolved hands.
    EveryHands(NonZeroU32),
}

impl CountCheckPolicy {
    /// Whether a check is due after `hands_played` resolved hands.
    pub fn is_due(self, hands_played: u32) -> bool {
        match self {
            CountCheckPolicy::Never => false,
            CountCheckPolicy::EveryHands(cadence) => {
                hands_played > 0 && hands_played % cadence.get() == 0
            }
        }
    }
}

impl Default for CountCheckPolicy {
    fn default() -> Self {
        CountCheckPolicy::EveryHands(NonZeroU32::new(4).expect("cadence is non-zero"))
    }
}

/// Training curriculum modes, one per onboarding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TrainingMode {
    /// Count down a full deck as fast as possible.
    DeckCountdown,
    /// Keep the running count while cards stream past.
    CountingDrill,
    /// Convert running counts into true counts.
    TrueCount,
    /// Full table play while keeping the count.
    #[default]
    PlayAndCount,
}

impl TrainingMode {
    /// All modes in curriculum order.
    pub const ALL: [TrainingMode; 4] = [
        TrainingMode::DeckCountdown,
        TrainingMode::CountingDrill,
        TrainingMode::TrueCount,
        TrainingMode::PlayAndCount,
    ];

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            TrainingMode::DeckCountdown => "Deck Countdown",
            TrainingMode::CountingDrill => "Counting Drill",
            TrainingMode::TrueCount => "True Count",
            TrainingMode::PlayAndCount => "Play & Count",
        }
    }
}

/// Immutable table configuration for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableRules {
    /// Decks in the shoe.
    pub decks: DeckCount,
    /// Deal pacing.
    pub deal_speed: DealSpeed,
    /// When count-verification prompts are due.
    pub count_check: CountCheckPolicy,
}

impl TableRules {
    /// Cards in a freshly shuffled shoe under these rules.
    pub fn shoe_size(&self) -> u32 {
        self.decks.cards()
    }
}

//! Fixed game dimensions.

/// Total cards in a Coruscant Shift deck: three suits of twenty plus two
/// wilds.
pub const DECK_SIZE: usize = 62;

/// Cards dealt to each player when a round opens.
pub const HAND_SIZE: usize = 5;

/// Seat cap. Six 5-card hands leave enough deck for a full sabacc shift
/// redraw plus tiebreaker draws.
pub const MAX_SEATS: usize = 6;

/// A round needs at least two players to mean anything.
pub const MIN_PLAYERS: usize = 2;

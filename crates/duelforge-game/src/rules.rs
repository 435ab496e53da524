//! Tunable rule parameters for a duel.
//!
//! One `GameRules` value is fixed at game start and never changes
//! mid-game. The defaults are the classic duel: 4 hp, a 53-card deck,
//! deal 4, draw 2.

/// Parameters for one game.
#[derive(Debug, Clone)]
pub struct GameRules {
    /// Starting and maximum hp per player.
    pub max_hp: u32,

    /// Cards dealt to each player before the first turn.
    pub opening_hand: usize,

    /// Cards the current player draws at the start of their turn.
    pub draw_per_turn: usize,

    /// Number of attack cards in the deck.
    pub attack_cards: usize,

    /// Number of defend cards in the deck.
    pub defend_cards: usize,

    /// Number of heal cards in the deck.
    pub heal_cards: usize,

    /// Whether the turn ring skips seats whose player is at 0 hp.
    ///
    /// Default `true`. Under the standard win condition the game ends
    /// at the first elimination, so the skip never fires — but with
    /// house-ruled win conditions a plain ring would hand turns to
    /// players who cannot act. Set `false` for the strict ring.
    pub skip_eliminated: bool,
}

impl GameRules {
    /// Total cards in a fresh deck.
    pub fn deck_size(&self) -> usize {
        self.attack_cards + self.defend_cards + self.heal_cards
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_hp: 4,
            opening_hand: 4,
            draw_per_turn: 2,
            attack_cards: 30,
            defend_cards: 15,
            heal_cards: 8,
            skip_eliminated: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deck_is_53_cards() {
        let rules = GameRules::default();
        assert_eq!(rules.deck_size(), 53);
        assert_eq!(rules.attack_cards, 30);
        assert_eq!(rules.defend_cards, 15);
        assert_eq!(rules.heal_cards, 8);
    }

    #[test]
    fn test_default_duel_parameters() {
        let rules = GameRules::default();
        assert_eq!(rules.max_hp, 4);
        assert_eq!(rules.opening_hand, 4);
        assert_eq!(rules.draw_per_turn, 2);
        assert!(rules.skip_eliminated);
    }
}

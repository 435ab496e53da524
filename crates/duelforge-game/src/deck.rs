//! Deck construction.
//!
//! A deck is just a `Vec<CardKind>` treated as a stack: draws pop from
//! the back. The engine shuffles once at game start and never
//! reshuffles — an exhausted deck stays exhausted.

use duelforge_protocol::CardKind;

use crate::GameRules;

/// Builds an unshuffled deck matching the rule counts, attacks first.
///
/// Callers shuffle it themselves; keeping this deterministic makes the
/// composition testable without pinning a seed.
pub fn standard_deck(rules: &GameRules) -> Vec<CardKind> {
    let mut deck = Vec::with_capacity(rules.deck_size());
    deck.extend(std::iter::repeat_n(CardKind::Attack, rules.attack_cards));
    deck.extend(std::iter::repeat_n(CardKind::Defend, rules.defend_cards));
    deck.extend(std::iter::repeat_n(CardKind::Heal, rules.heal_cards));
    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(deck: &[CardKind], kind: CardKind) -> usize {
        deck.iter().filter(|c| **c == kind).count()
    }

    #[test]
    fn test_standard_deck_composition_matches_rules() {
        let rules = GameRules::default();
        let deck = standard_deck(&rules);

        assert_eq!(deck.len(), 53);
        assert_eq!(count(&deck, CardKind::Attack), 30);
        assert_eq!(count(&deck, CardKind::Defend), 15);
        assert_eq!(count(&deck, CardKind::Heal), 8);
    }

    #[test]
    fn test_standard_deck_honors_custom_counts() {
        let rules = GameRules {
            attack_cards: 2,
            defend_cards: 1,
            heal_cards: 0,
            ..GameRules::default()
        };
        let deck = standard_deck(&rules);

        assert_eq!(deck.len(), 3);
        assert_eq!(count(&deck, CardKind::Heal), 0);
    }
}

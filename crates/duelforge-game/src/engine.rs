//! The duel engine: hp, hands, deck, turn ring, combat.
//!
//! [`GameInstance`] is a pure state machine. It never touches a
//! socket, a lock, or a registry: every operation returns an
//! [`Outbox`] of `(Recipient, Message)` pairs and the *caller* decides
//! how to deliver them. That keeps the ownership graph a strict tree
//! (room owns engine, engine owns nothing) and makes every rule
//! testable with plain function calls.
//!
//! # Turn structure
//!
//! ```text
//!          ┌────────────────────────────────────────────┐
//!          ▼                                            │
//!   draw 2 → GameState(Draw) → GameState(Play) → moves ─┘ (EndTurn)
//!                                              │
//!                                              ▼ (a player hits 0 hp)
//!                            GameState(Play) → GameOver
//! ```
//!
//! Combat is instant: an attack is announced to the target with a
//! whispered prompt, then resolved on the spot. If the target holds a
//! defend card it is consumed and the attack is blocked; otherwise the
//! target loses 1 hp. The first player to reach 0 hp ends the game,
//! and the winner is the first seat (in seating order) still above 0.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use duelforge_protocol::{
    CardKind, GameSnapshot, Message, PlayerAction, PlayerId, PlayerSnapshot,
    Recipient, TurnPhase,
};

use crate::{GameError, GameRules, deck::standard_deck};

/// Messages produced by an engine operation, each tagged with where it
/// should go. `Recipient::All` means the whole room; `Recipient::Player`
/// is a whisper.
pub type Outbox = Vec<(Recipient, Message)>;

// ---------------------------------------------------------------------------
// Player state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PlayerState {
    hp: u32,
    max_hp: u32,
    hand: Vec<CardKind>,
}

impl PlayerState {
    fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            hand: Vec::new(),
        }
    }

    fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Removes one card of `kind` from the hand. Returns `false` if
    /// none was held.
    fn take_card(&mut self, kind: CardKind) -> bool {
        match self.hand.iter().position(|c| *c == kind) {
            Some(index) => {
                self.hand.remove(index);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// GameInstance
// ---------------------------------------------------------------------------

/// One running duel.
///
/// Constructed by [`start`](GameInstance::start) with the seating
/// order fixed for the whole game; seats never move, even if a player
/// leaves the room. `current` always indexes a valid seat.
#[derive(Debug)]
pub struct GameInstance {
    rules: GameRules,
    /// Seating order. Also the turn order and every enumeration order.
    seats: Vec<PlayerId>,
    players: HashMap<PlayerId, PlayerState>,
    /// Draw pile; draws pop from the back.
    deck: Vec<CardKind>,
    /// Index into `seats` of the player whose turn it is.
    current: usize,
    over: bool,
    winner: Option<PlayerId>,
}

impl GameInstance {
    /// Starts a duel with a deck shuffled from the thread rng.
    pub fn start(
        seats: &[PlayerId],
        rules: GameRules,
    ) -> Result<(Self, Outbox), GameError> {
        Self::start_with_rng(seats, rules, &mut rand::rng())
    }

    /// Starts a duel with a caller-supplied rng (tests pin a seed).
    ///
    /// Deals the opening hands in seating order, then runs the first
    /// turn-start sequence for seat 0. The returned outbox carries the
    /// initial `Draw` and `Play` state pushes.
    ///
    /// # Errors
    /// [`GameError::NotEnoughPlayers`] if fewer than two seats.
    pub fn start_with_rng<R: Rng + ?Sized>(
        seats: &[PlayerId],
        rules: GameRules,
        rng: &mut R,
    ) -> Result<(Self, Outbox), GameError> {
        if seats.len() < 2 {
            return Err(GameError::NotEnoughPlayers { got: seats.len() });
        }

        let mut deck = standard_deck(&rules);
        deck.shuffle(rng);

        let players = seats
            .iter()
            .map(|pid| (*pid, PlayerState::new(rules.max_hp)))
            .collect();

        let mut game = Self {
            rules,
            seats: seats.to_vec(),
            players,
            deck,
            current: 0,
            over: false,
            winner: None,
        };

        for pid in game.seats.clone() {
            game.draw(pid, game.rules.opening_hand);
        }

        let mut out = Outbox::new();
        game.begin_turn(&mut out);
        Ok((game, out))
    }

    // -- Accessors ---------------------------------------------------------

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn current_player(&self) -> PlayerId {
        self.seats[self.current]
    }

    pub fn seats(&self) -> &[PlayerId] {
        &self.seats
    }

    /// Full public state, players in seating order.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            current: self.current_player(),
            players: self
                .seats
                .iter()
                .filter_map(|pid| {
                    self.players.get(pid).map(|p| PlayerSnapshot {
                        player_id: *pid,
                        hp: p.hp,
                        max_hp: p.max_hp,
                        hand: p.hand.clone(),
                    })
                })
                .collect(),
        }
    }

    // -- Actions -----------------------------------------------------------

    /// Applies one action from `actor`.
    ///
    /// On rejection the state is untouched; on success the returned
    /// outbox holds everything that must be delivered, in order.
    ///
    /// # Errors
    /// See [`GameError`] for the rejection taxonomy. The gate checks
    /// run in a fixed order: finished game, unknown actor, eliminated
    /// actor, wrong turn, then per-action rules.
    pub fn handle_action(
        &mut self,
        actor: PlayerId,
        action: PlayerAction,
    ) -> Result<Outbox, GameError> {
        if self.over {
            return Err(GameError::Finished);
        }
        let actor_state = self
            .players
            .get(&actor)
            .ok_or(GameError::NotInGame(actor))?;
        if !actor_state.is_alive() {
            return Err(GameError::Eliminated(actor));
        }
        if self.current_player() != actor {
            return Err(GameError::NotYourTurn(actor));
        }

        match action {
            PlayerAction::PlayCard {
                card: CardKind::Attack,
                target,
            } => {
                let target = target.ok_or(GameError::TargetRequired)?;
                self.play_attack(actor, target)
            }
            PlayerAction::PlayCard {
                card: CardKind::Heal,
                ..
            } => self.play_heal(actor),
            PlayerAction::PlayCard {
                card: CardKind::Defend,
                ..
            } => Err(GameError::CardNotPlayable(CardKind::Defend)),
            PlayerAction::EndTurn => {
                tracing::debug!(player_id = %actor, "turn ended");
                let mut out = Outbox::new();
                // The room hears the turn end before the pointer moves;
                // the hand-off becomes visible with the next draw push.
                self.push_state(
                    &mut out,
                    Recipient::All,
                    TurnPhase::Play,
                    format!("{actor} ends their turn"),
                );
                self.advance_turn();
                self.begin_turn(&mut out);
                Ok(out)
            }
        }
    }

    // -- Combat ------------------------------------------------------------

    fn play_attack(
        &mut self,
        attacker: PlayerId,
        target: PlayerId,
    ) -> Result<Outbox, GameError> {
        if target == attacker {
            return Err(GameError::InvalidTarget(target));
        }
        if !self.players.get(&target).is_some_and(PlayerState::is_alive) {
            return Err(GameError::InvalidTarget(target));
        }
        // Validate before mutating: the card leaves the hand only once
        // the whole action is known to be legal.
        {
            let attacker_state = self
                .players
                .get_mut(&attacker)
                .ok_or(GameError::NotInGame(attacker))?;
            if !attacker_state.take_card(CardKind::Attack) {
                return Err(GameError::CardNotInHand(CardKind::Attack));
            }
        }

        let mut out = Outbox::new();

        // The target hears about the attack privately before the room
        // sees the outcome.
        self.push_state(
            &mut out,
            Recipient::Player(target),
            TurnPhase::Play,
            format!("{attacker} attacks you, a defend card will block it"),
        );

        let blocked = self
            .players
            .get_mut(&target)
            .is_some_and(|t| t.take_card(CardKind::Defend));

        if blocked {
            tracing::debug!(%attacker, %target, "attack blocked");
            self.push_state(
                &mut out,
                Recipient::All,
                TurnPhase::Play,
                format!("{target} blocks {attacker}'s attack with a defend card"),
            );
            return Ok(out);
        }

        let target_hp = match self.players.get_mut(&target) {
            Some(t) => {
                t.hp = t.hp.saturating_sub(1);
                t.hp
            }
            None => return Err(GameError::InvalidTarget(target)),
        };
        tracing::debug!(%attacker, %target, hp = target_hp, "attack hit");

        if target_hp == 0 {
            self.over = true;
            self.winner = self.first_alive();
            let winner = self.winner.unwrap_or(attacker);
            tracing::info!(%winner, %target, "duel over");

            self.push_state(
                &mut out,
                Recipient::All,
                TurnPhase::Play,
                format!("{attacker} hits {target} for 1 damage, {target} falls, {winner} wins the duel"),
            );
            out.push((Recipient::All, Message::GameOver { winner }));
        } else {
            self.push_state(
                &mut out,
                Recipient::All,
                TurnPhase::Play,
                format!("{attacker} hits {target} for 1 damage, {target_hp} hp left"),
            );
        }
        Ok(out)
    }

    fn play_heal(&mut self, actor: PlayerId) -> Result<Outbox, GameError> {
        let state = self
            .players
            .get_mut(&actor)
            .ok_or(GameError::NotInGame(actor))?;
        if !state.hand.contains(&CardKind::Heal) {
            return Err(GameError::CardNotInHand(CardKind::Heal));
        }
        if state.hp >= state.max_hp {
            return Err(GameError::AlreadyAtFullHp(actor));
        }

        state.take_card(CardKind::Heal);
        state.hp = (state.hp + 1).min(state.max_hp);
        let hp = state.hp;
        tracing::debug!(player_id = %actor, hp, "heal played");

        let mut out = Outbox::new();
        self.push_state(
            &mut out,
            Recipient::All,
            TurnPhase::Play,
            format!("{actor} heals 1 hp, now at {hp}"),
        );
        Ok(out)
    }

    // -- Turn flow ---------------------------------------------------------

    /// Draws up to `count` cards for `pid`. An empty deck makes the
    /// remainder a silent no-op. Returns how many were actually drawn.
    fn draw(&mut self, pid: PlayerId, count: usize) -> usize {
        let Some(player) = self.players.get_mut(&pid) else {
            return 0;
        };
        let mut drawn = 0;
        for _ in 0..count {
            let Some(card) = self.deck.pop() else { break };
            player.hand.push(card);
            drawn += 1;
        }
        drawn
    }

    /// Runs the turn-start sequence for the current player: draw, then
    /// the `Draw` and `Play` state pushes.
    fn begin_turn(&mut self, out: &mut Outbox) {
        let pid = self.current_player();
        let drawn = self.draw(pid, self.rules.draw_per_turn);

        let draw_log = if drawn == 0 {
            format!("{pid} draws nothing, the deck is empty")
        } else {
            let plural = if drawn == 1 { "" } else { "s" };
            format!("{pid} draws {drawn} card{plural}")
        };
        self.push_state(out, Recipient::All, TurnPhase::Draw, draw_log);
        self.push_state(
            out,
            Recipient::All,
            TurnPhase::Play,
            format!("It's {pid}'s turn"),
        );
    }

    /// Moves the turn pointer to the next seat. With `skip_eliminated`
    /// set, seats at 0 hp are passed over; the scan is bounded by one
    /// full lap so a pathological all-dead table cannot loop forever.
    fn advance_turn(&mut self) {
        let n = self.seats.len();
        self.current = (self.current + 1) % n;
        if self.rules.skip_eliminated {
            for _ in 0..n {
                if self.hp_of(self.seats[self.current]) > 0 {
                    break;
                }
                self.current = (self.current + 1) % n;
            }
        }
    }

    /// First seat, in seating order, whose player is still alive.
    fn first_alive(&self) -> Option<PlayerId> {
        self.seats
            .iter()
            .copied()
            .find(|pid| self.hp_of(*pid) > 0)
    }

    fn hp_of(&self, pid: PlayerId) -> u32 {
        self.players.get(&pid).map_or(0, |p| p.hp)
    }

    fn push_state(
        &self,
        out: &mut Outbox,
        to: Recipient,
        phase: TurnPhase,
        log: String,
    ) {
        out.push((
            to,
            Message::GameState {
                phase,
                state: self.snapshot(),
                log,
            },
        ));
    }
}

// =========================================================================
// Tests
// =========================================================================

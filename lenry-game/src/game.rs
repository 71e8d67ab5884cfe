//! The game aggregate: seats, roles, deck, counters and the current round.
//!
//! `Game` is a value. Every operation borrows the current game and returns
//! the next one, which keeps "load, apply one action, save" safe to repeat
//! against a freshly loaded copy.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashSet};

use crate::config::RulesConfig;
use crate::constants::HAND_SIZE;
use crate::deck::{Policy, PolicyDeck};
use crate::eligibility::eligible_main_squeeze_candidates;
use crate::error::GameError;
use crate::roles::{Role, Team, assign_roles};
use crate::round::{Outcome, RoundPhase};
use crate::seed::GameRng;

/// Cards held during the legislative session of an elected round.
pub type Hand = SmallVec<[Policy; HAND_SIZE]>;

/// Who currently holds policy cards, if anyone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "holder", content = "cards", rename_all = "snake_case")]
pub enum Legislation {
    #[default]
    Idle,
    /// Governor holds three cards and must discard one.
    Governor(Hand),
    /// Main squeeze holds two cards, discards one and enacts the other.
    MainSqueeze(Hand),
}

impl Legislation {
    #[must_use]
    pub fn cards(&self) -> &[Policy] {
        match self {
            Self::Idle => &[],
            Self::Governor(hand) | Self::MainSqueeze(hand) => hand,
        }
    }
}

/// Enacted policy counters. Only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Enacted {
    pub liberal: u8,
    pub fascist: u8,
}

impl Enacted {
    #[must_use]
    pub const fn total(self) -> usize {
        self.liberal as usize + self.fascist as usize
    }

    fn record(&mut self, policy: Policy) {
        match policy {
            Policy::Liberal => self.liberal = self.liberal.saturating_add(1),
            Policy::Fascist => self.fascist = self.fascist.saturating_add(1),
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    LiberalPolicies,
    FascistPolicies,
    LenryElected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Victory {
    pub team: Team,
    pub reason: VictoryReason,
}

/// Complete state of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub(crate) host_id: String,
    pub(crate) players: Vec<String>,
    pub(crate) roles: Vec<Role>,
    pub(crate) deck: PolicyDeck,
    pub(crate) enacted: Enacted,
    pub(crate) governor: usize,
    pub(crate) main_squeeze: Option<usize>,
    pub(crate) round: RoundPhase,
    pub(crate) legislation: Legislation,
    pub(crate) rules: RulesConfig,
}

impl Game {
    /// Start a game under the standard rules.
    ///
    /// Roles, the deck shuffle and the first governor all come from `rng`.
    ///
    /// # Errors
    ///
    /// `InvalidPlayerCount` outside 5..=10 players, `DuplicatePlayer` when an
    /// id is seated twice.
    pub fn new<R: Rng + ?Sized>(
        host_id: impl Into<String>,
        players: Vec<String>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        Self::with_rules(host_id, players, RulesConfig::default(), rng)
    }

    /// Start a game under custom rules.
    ///
    /// # Errors
    ///
    /// As [`Game::new`], plus `Rules` when the rules fail validation.
    pub fn with_rules<R: Rng + ?Sized>(
        host_id: impl Into<String>,
        players: Vec<String>,
        rules: RulesConfig,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        Self::setup(host_id.into(), players, rules, |players, rules| {
            let roles = assign_roles(players, rng)?;
            let deck = PolicyDeck::with_composition(rules.composition(), rng);
            let governor = rng.gen_range(0..players.len());
            Ok((roles, deck, governor))
        })
    }

    /// Start a game whose setup is fully determined by `seed`.
    ///
    /// Roles, deck and governor each draw from their own stream so that the
    /// same seed always produces the same table.
    ///
    /// # Errors
    ///
    /// As [`Game::with_rules`].
    pub fn new_seeded(
        host_id: impl Into<String>,
        players: Vec<String>,
        rules: RulesConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        let mut streams = GameRng::from_user_seed(seed);
        Self::setup(host_id.into(), players, rules, |players, rules| {
            let roles = assign_roles(players, &mut streams.roles)?;
            let deck = PolicyDeck::with_composition(rules.composition(), &mut streams.deck);
            let governor = streams.governor.gen_range(0..players.len());
            Ok((roles, deck, governor))
        })
    }

    fn setup<F>(
        host_id: String,
        players: Vec<String>,
        rules: RulesConfig,
        deal: F,
    ) -> Result<Self, GameError>
    where
        F: FnOnce(&[String], &RulesConfig) -> Result<(Vec<Role>, PolicyDeck, usize), GameError>,
    {
        rules.validate()?;
        crate::roles::check_player_count(players.len())?;
        let mut seen = HashSet::with_capacity(players.len());
        if let Some(dup) = players.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(GameError::DuplicatePlayer(dup.clone()));
        }
        let (roles, deck, governor) = deal(&players, &rules)?;
        log::debug!(
            "game {host_id} created: {} players, governor seat {governor}",
            players.len()
        );
        Ok(Self {
            host_id,
            players,
            roles,
            deck,
            enacted: Enacted::default(),
            governor,
            main_squeeze: None,
            round: RoundPhase::Nominating,
            legislation: Legislation::Idle,
            rules,
        })
    }

    #[must_use]
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Player ids in seat order.
    #[must_use]
    pub fn players(&self) -> &[String] {
        &self.players
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Roles in seat order.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub fn role_of(&self, seat: usize) -> Option<Role> {
        self.roles.get(seat).copied()
    }

    /// Seat of a player id.
    ///
    /// # Errors
    ///
    /// `UnknownPlayer` when the id is not seated.
    pub fn seat_of(&self, player_id: &str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|id| id == player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))
    }

    #[must_use]
    pub fn lenry_seat(&self) -> Option<usize> {
        self.roles.iter().position(|role| *role == Role::Lenry)
    }

    #[must_use]
    pub const fn governor(&self) -> usize {
        self.governor
    }

    #[must_use]
    pub const fn main_squeeze(&self) -> Option<usize> {
        self.main_squeeze
    }

    #[must_use]
    pub const fn phase(&self) -> &RoundPhase {
        &self.round
    }

    #[must_use]
    pub const fn legislation(&self) -> &Legislation {
        &self.legislation
    }

    /// Cards currently held by the governor or main squeeze.
    #[must_use]
    pub fn hand(&self) -> &[Policy] {
        self.legislation.cards()
    }

    #[must_use]
    pub const fn deck(&self) -> &PolicyDeck {
        &self.deck
    }

    #[must_use]
    pub fn draw_pile(&self) -> &[Policy] {
        self.deck.draw_pile()
    }

    #[must_use]
    pub fn discard_pile(&self) -> &[Policy] {
        self.deck.discard_pile()
    }

    #[must_use]
    pub const fn enacted(&self) -> Enacted {
        self.enacted
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Every card still accounted for: both piles, the hand in play and the
    /// enacted counters. Always equals the deck size the game started with.
    #[must_use]
    pub fn card_total(&self) -> usize {
        self.deck.len() + self.hand().len() + self.enacted.total()
    }

    /// Seats the current governor may nominate.
    #[must_use]
    pub fn eligible_candidates(&self) -> BTreeSet<usize> {
        eligible_main_squeeze_candidates(self.player_count(), self.governor)
    }

    /// The winning side, if the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<Victory> {
        let rules = &self.rules;
        if self.enacted.liberal >= rules.liberal_to_win {
            return Some(Victory {
                team: Team::Janitors,
                reason: VictoryReason::LiberalPolicies,
            });
        }
        if self.enacted.fascist >= rules.fascist_to_win {
            return Some(Victory {
                team: Team::Henries,
                reason: VictoryReason::FascistPolicies,
            });
        }
        if self.lenry_just_elected() && self.enacted.fascist >= rules.lenry_elected_after {
            return Some(Victory {
                team: Team::Henries,
                reason: VictoryReason::LenryElected,
            });
        }
        None
    }

    /// Lenry won the vote that is still resolved. Enacting a policy clears
    /// the round, so a later fascist policy never completes this trigger.
    fn lenry_just_elected(&self) -> bool {
        match self.round {
            RoundPhase::Resolved {
                candidate,
                outcome: Outcome::Elected,
                ..
            } => self.lenry_seat() == Some(candidate),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.winner().is_some()
    }

    /// Governor nominates `candidate` for main squeeze.
    ///
    /// # Errors
    ///
    /// `InvalidState` when a round is already open or the game is over,
    /// `IneligibleCandidate` when the seat may not be nominated.
    pub fn nominate(&self, candidate: usize) -> Result<Self, GameError> {
        self.ensure_running("nominate")?;
        let round = self
            .round
            .nominate(self.player_count(), self.governor, candidate)?;
        log::debug!(
            "game {}: governor {} nominated seat {candidate}",
            self.host_id,
            self.governor
        );
        Ok(Self {
            round,
            ..self.clone()
        })
    }

    /// Record `voter`'s ballot on the open nomination.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the voting phase, `UnknownVoter`, `DuplicateVote`.
    pub fn cast_vote(&self, voter: usize, approve: bool) -> Result<Self, GameError> {
        self.ensure_running("cast_vote")?;
        let round = self.round.cast_vote(voter, approve)?;
        log::debug!("game {}: seat {voter} voted {approve}", self.host_id);
        Ok(Self {
            round,
            ..self.clone()
        })
    }

    /// Close the vote.
    ///
    /// Elected: the candidate becomes main squeeze and the round stays
    /// resolved until the legislative session finishes. Rejected: the round is
    /// cleared and the next seat governs.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless votes are open.
    pub fn resolve(&self) -> Result<(Self, Outcome), GameError> {
        self.ensure_running("resolve")?;
        let resolved = self.round.resolve()?;
        let mut next = self.clone();
        let outcome = match resolved {
            RoundPhase::Resolved {
                candidate,
                outcome: Outcome::Elected,
                ..
            } => {
                next.main_squeeze = Some(candidate);
                next.round = resolved;
                Outcome::Elected
            }
            _ => {
                next.round = RoundPhase::Nominating;
                next.advance_governor();
                Outcome::Rejected
            }
        };
        log::debug!(
            "game {}: vote resolved {outcome:?} with {} approvals",
            self.host_id,
            self.round.approvals()
        );
        Ok((next, outcome))
    }

    /// Governor draws the legislative hand after a successful election.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless an elected round is waiting for its draw,
    /// `InsufficientCards` when the deck cannot cover the hand.
    pub fn draw_policies<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self, GameError> {
        self.ensure_running("draw_policies")?;
        if self.round.outcome() != Some(Outcome::Elected) {
            return Err(self.round.invalid("draw_policies"));
        }
        if self.legislation != Legislation::Idle {
            return Err(GameError::InvalidState {
                operation: "draw_policies",
                phase: "while policies are in hand",
            });
        }
        let mut next = self.clone();
        let drawn = next.deck.draw(HAND_SIZE, self.rules.reshuffle, rng)?;
        next.legislation = Legislation::Governor(drawn.into_iter().collect());
        log::debug!(
            "game {}: governor {} drew {:?}",
            self.host_id,
            self.governor,
            next.hand()
        );
        Ok(next)
    }

    /// Discard the card at `index` from the hand in play.
    ///
    /// The governor discards one of three and passes the rest on. The main
    /// squeeze discards one of two; the last card is enacted, the round is
    /// cleared and the next seat governs.
    ///
    /// # Errors
    ///
    /// `InvalidChoice` when `index` is outside the hand, `InvalidState` when
    /// nobody holds cards.
    pub fn choose_discard(&self, index: usize) -> Result<Self, GameError> {
        self.ensure_running("choose_discard")?;
        let mut next = self.clone();
        match &self.legislation {
            Legislation::Idle => {
                return Err(GameError::InvalidState {
                    operation: "choose_discard",
                    phase: "while no policies are in hand",
                });
            }
            Legislation::Governor(hand) => {
                let (discarded, kept) = split_hand(hand, index)?;
                next.deck.discard([discarded]);
                next.legislation = Legislation::MainSqueeze(kept);
                log::debug!("game {}: governor discarded {discarded}", self.host_id);
            }
            Legislation::MainSqueeze(hand) => {
                let (discarded, kept) = split_hand(hand, index)?;
                let [enacted] = kept[..] else {
                    return Err(GameError::InvalidState {
                        operation: "choose_discard",
                        phase: "with a main squeeze hand not holding two cards",
                    });
                };
                next.deck.discard([discarded]);
                next.enacted.record(enacted);
                log::debug!("game {}: enacted {enacted} policy", self.host_id);
                next.legislation = Legislation::Idle;
                next.round = RoundPhase::Nominating;
                next.advance_governor();
            }
        }
        Ok(next)
    }

    fn advance_governor(&mut self) {
        self.governor = (self.governor + 1) % self.player_count();
    }

    fn ensure_running(&self, operation: &'static str) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::InvalidState {
                operation,
                phase: "after the game ended",
            });
        }
        Ok(())
    }
}

fn split_hand(hand: &Hand, index: usize) -> Result<(Policy, Hand), GameError> {
    if index >= hand.len() {
        return Err(GameError::InvalidChoice {
            index,
            hand: hand.len(),
        });
    }
    let mut kept = hand.clone();
    let discarded = kept.remove(index);
    Ok((discarded, kept))
}

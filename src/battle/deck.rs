//! Card piles for one combatant: deck, hand, discard, exhaust

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::cards::GeneratedCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PileSizes {
    pub deck: usize,
    pub hand: usize,
    pub discard: usize,
    pub exhaust: usize,
}

/// Result of one draw attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draw {
    pub card: Option<GeneratedCard>,
    /// The discard pile was shuffled back into the deck first
    pub reshuffled: bool,
}

/// The deck is drawn from the back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPiles {
    pub deck: Vec<GeneratedCard>,
    pub hand: Vec<GeneratedCard>,
    pub discard: Vec<GeneratedCard>,
    pub exhaust: Vec<GeneratedCard>,
}

impl CardPiles {
    /// Shuffled deck built from a combatant's cards
    pub fn new<R: Rng + ?Sized>(cards: Vec<GeneratedCard>, rng: &mut R) -> Self {
        let mut piles = Self {
            deck: cards,
            ..Default::default()
        };
        piles.deck.shuffle(rng);
        piles
    }

    pub fn sizes(&self) -> PileSizes {
        PileSizes {
            deck: self.deck.len(),
            hand: self.hand.len(),
            discard: self.discard.len(),
            exhaust: self.exhaust.len(),
        }
    }

    /// Move the discard pile into the deck and shuffle it
    pub fn recycle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.deck.append(&mut self.discard);
        self.deck.shuffle(rng);
    }

    /// Draw one card into the hand, recycling the discard when the deck is
    /// empty. Drawing with nothing left is not an error.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Draw {
        let mut reshuffled = false;
        if self.deck.is_empty() && !self.discard.is_empty() {
            self.recycle(rng);
            reshuffled = true;
        }
        let card = self.deck.pop();
        if let Some(card) = &card {
            self.hand.push(card.clone());
        }
        Draw { card, reshuffled }
    }

    /// Take a played card out of the hand; it goes to exhaust or discard
    pub fn play_from_hand(&mut self, index: usize, exhausts: bool) -> Option<GeneratedCard> {
        if index >= self.hand.len() {
            return None;
        }
        let card = self.hand.remove(index);
        let pile = if exhausts {
            &mut self.exhaust
        } else {
            &mut self.discard
        };
        pile.push(card.clone());
        Some(card)
    }

    pub fn hand_index_of(&self, card_id: &str) -> Option<usize> {
        self.hand.iter().position(|c| c.id == card_id)
    }

    /// Every card this combatant owns, regardless of pile
    pub fn all_cards(&self) -> impl Iterator<Item = &GeneratedCard> {
        self.deck
            .iter()
            .chain(&self.hand)
            .chain(&self.discard)
            .chain(&self.exhaust)
    }
}

//! Price negotiation heuristic.
//!
//! Ports haggle: they name a price, we counter, they counter back. The
//! heuristic opens a few percent off their price and then closes part of the
//! gap each round, more aggressively once the port says the offer is final.

use tracing::debug;

/// Opening multiplier when selling to a port.
const SELL_OPENING: f64 = 1.07;
/// Opening multiplier when buying from a port.
const BUY_OPENING: f64 = 0.95;
/// Planet-sourced sales open at `ceil(offer / PLANET_DIVISOR) - 1`.
const PLANET_DIVISOR: f64 = 0.94;
const GAP_CLOSE: f64 = 0.3;
const GAP_CLOSE_FINAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOperation {
    Buy,
    Sell,
}

/// Where the goods being sold come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeSource {
    #[default]
    Holds,
    Planet,
}

/// Negotiation state for the trade in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Negotiation {
    operation: Option<TradeOperation>,
    source: TradeSource,
    prev_their_offer: Option<u64>,
    prev_our_offer: f64,
    final_offer: bool,
    agreed_units: Option<u32>,
}

impl Negotiation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new trade opened. Forgets the previous round's offers.
    pub fn begin(&mut self, operation: TradeOperation, source: TradeSource) {
        self.operation = Some(operation);
        self.source = source;
        self.prev_their_offer = None;
        self.agreed_units = None;
    }

    /// The port's next offer will not move.
    pub fn mark_final(&mut self) {
        self.final_offer = true;
    }

    pub fn record_units(&mut self, units: u32) {
        self.agreed_units = Some(units);
    }

    pub fn operation(&self) -> Option<TradeOperation> {
        self.operation
    }

    pub fn agreed_units(&self) -> Option<u32> {
        self.agreed_units
    }

    pub fn is_final(&self) -> bool {
        self.final_offer
    }

    /// Compute our counter to `their_offer`.
    ///
    /// Returns `None` when the port repeats its previous offer unchanged;
    /// the caller should stop negotiating this round.
    pub fn counter(&mut self, their_offer: u64) -> Option<u64> {
        let their = their_offer as f64;
        let ours = match self.prev_their_offer {
            None => match (self.operation, self.source) {
                (Some(TradeOperation::Sell), TradeSource::Planet) => {
                    (their / PLANET_DIVISOR).ceil() - 1.0
                }
                (Some(TradeOperation::Sell), TradeSource::Holds) => their * SELL_OPENING,
                _ => their * BUY_OPENING,
            },
            Some(prev) if prev == their_offer => {
                debug!(their_offer, "Port repeated its offer, giving up");
                return None;
            }
            Some(_) => {
                let mult = if self.final_offer {
                    GAP_CLOSE_FINAL
                } else {
                    GAP_CLOSE
                };
                let delta = self.prev_our_offer - their;
                self.prev_our_offer - delta * mult
            }
        };

        self.prev_their_offer = Some(their_offer);
        self.prev_our_offer = ours;
        self.final_offer = false;
        Some(ours.max(0.0).trunc() as u64)
    }
}

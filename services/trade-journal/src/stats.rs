//! Journal summary statistics
//!
//! Accumulates at full `f64` precision; rounding to cents/basis points
//! happens only when the summary is produced. Totals saturate at the
//! `f64` range so every reported figure stays finite.

use crate::models::{Trade, TradeStats};

/// The two fields statistics read from a trade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSample {
    pub pnl: Option<f64>,
    pub usd_amount: f64,
}

impl From<&Trade> for StatsSample {
    fn from(trade: &Trade) -> Self {
        Self {
            pnl: trade.pnl,
            usd_amount: trade.usd_amount,
        }
    }
}

/// Running totals over a trade set
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    total_trades: u64,
    with_pnl: u64,
    winning: u64,
    losing: u64,
    total_pnl: f64,
    total_invested: f64,
}

impl StatsAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sample: StatsSample) {
        self.total_trades += 1;
        self.total_invested = saturating_add(self.total_invested, sample.usd_amount);

        if let Some(pnl) = sample.pnl {
            self.with_pnl += 1;
            self.total_pnl = saturating_add(self.total_pnl, pnl);
            if pnl > 0.0 {
                self.winning += 1;
            } else if pnl < 0.0 {
                self.losing += 1;
            }
        }
    }

    /// Produce the rounded summary
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn finish(&self) -> TradeStats {
        let (win_rate, avg_pnl) = if self.with_pnl > 0 {
            (
                self.winning as f64 / self.with_pnl as f64 * 100.0,
                self.total_pnl / self.with_pnl as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let roi = if self.total_invested > 0.0 {
            self.total_pnl / self.total_invested * 100.0
        } else {
            0.0
        };

        TradeStats {
            total_trades: self.total_trades,
            total_pnl: round2(self.total_pnl),
            total_invested: round2(self.total_invested),
            winning_trades: self.winning,
            losing_trades: self.losing,
            win_rate: round2(win_rate),
            avg_pnl: round2(avg_pnl),
            roi: round2(clamp_finite(roi)),
        }
    }
}

impl Extend<StatsSample> for StatsAccumulator {
    fn extend<I: IntoIterator<Item = StatsSample>>(&mut self, iter: I) {
        for sample in iter {
            self.add(sample);
        }
    }
}

/// Summarize a full trade set
pub fn summarize<I>(samples: I) -> TradeStats
where
    I: IntoIterator<Item = StatsSample>,
{
    let mut acc = StatsAccumulator::new();
    acc.extend(samples);
    acc.finish()
}

/// Round to two decimal places for display
///
/// Values too large to scale are already whole and come back unchanged.
#[must_use]
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

fn saturating_add(total: f64, value: f64) -> f64 {
    clamp_finite(total + clamp_finite(value))
}

/// Pin infinities to the `f64` range; NaN reads as zero
fn clamp_finite(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

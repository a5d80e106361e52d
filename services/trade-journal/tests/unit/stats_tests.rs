//! Summary statistics tests

use approx::assert_relative_eq;
use rstest::*;
use trade_journal::stats::{StatsAccumulator, StatsSample, round2, summarize};

fn sample(pnl: Option<f64>, usd_amount: f64) -> StatsSample {
    StatsSample { pnl, usd_amount }
}

#[fixture]
fn journal() -> Vec<StatsSample> {
    vec![
        sample(Some(100.0), 1000.0),
        sample(Some(-50.0), 500.0),
        sample(None, 300.0),
        sample(Some(25.0), 200.0),
    ]
}

#[rstest]
fn test_reference_journal_summary(journal: Vec<StatsSample>) {
    let stats = summarize(journal);

    assert_eq!(stats.total_trades, 4);
    assert_relative_eq!(stats.total_pnl, 75.0);
    assert_relative_eq!(stats.win_rate, 66.67);
    assert_relative_eq!(stats.avg_pnl, 25.0);
    assert_relative_eq!(stats.total_invested, 2000.0);
    assert_relative_eq!(stats.roi, 3.75);
    assert_eq!(stats.winning_trades, 2);
    assert_eq!(stats.losing_trades, 1);
}

#[rstest]
fn test_empty_journal_is_all_zero() {
    let stats = summarize(Vec::new());
    assert_eq!(stats.total_trades, 0);
    assert_relative_eq!(stats.total_pnl, 0.0);
    assert_relative_eq!(stats.win_rate, 0.0);
    assert_relative_eq!(stats.avg_pnl, 0.0);
    assert_relative_eq!(stats.roi, 0.0);
}

#[rstest]
fn test_trades_without_pnl_count_but_do_not_rate() {
    let stats = summarize(vec![sample(None, 100.0), sample(None, 50.0)]);
    assert_eq!(stats.total_trades, 2);
    assert_relative_eq!(stats.total_invested, 150.0);
    assert_relative_eq!(stats.win_rate, 0.0);
    assert_relative_eq!(stats.avg_pnl, 0.0);
}

#[rstest]
fn test_breakeven_is_neither_win_nor_loss() {
    let stats = summarize(vec![sample(Some(0.0), 100.0), sample(Some(10.0), 100.0)]);
    assert_eq!(stats.winning_trades, 1);
    assert_eq!(stats.losing_trades, 0);
    assert_relative_eq!(stats.win_rate, 50.0);
}

#[rstest]
fn test_rounding_happens_once_at_the_end() {
    // Three thirds of a cent sum to a full cent only at full precision
    let mut acc = StatsAccumulator::new();
    acc.extend((0..3).map(|_| sample(Some(0.01 / 3.0), 1.0)));
    assert_relative_eq!(acc.finish().total_pnl, 0.01);
}

#[rstest]
#[case(66.666_666, 66.67)]
#[case(3.746, 3.75)]
#[case(-12.344, -12.34)]
fn test_round2(#[case] value: f64, #[case] expected: f64) {
    assert_relative_eq!(round2(value), expected);
}

#[rstest]
fn test_summary_stays_finite_past_f64_range() {
    let stats = summarize((0..3).map(|_| sample(Some(1e308), 1e308)));
    assert_eq!(stats.total_trades, 3);
    assert!(stats.total_pnl.is_finite());
    assert!(stats.total_invested.is_finite());
    assert!(stats.avg_pnl.is_finite());
    assert!(stats.roi.is_finite());
    assert_relative_eq!(stats.win_rate, 100.0);
}

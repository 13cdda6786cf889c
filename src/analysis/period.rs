//! Analysis period reconciliation.
//!
//! IAHRIS needs at least 15 consecutive calendar years on each side of a
//! comparison. The natural and altered periods are independent: they may
//! differ, overlap or be disjoint, but each must meet the minimum on its own.
//! The check runs once per export attempt, after both series are in hand and
//! before anything is formatted, so a doomed request never writes a file.

use crate::model::{
    AnalysisPeriod, ExportError, FlowSeries, MIN_PERIOD_SPAN_YEARS, PeriodShortfall, Result, SeriesRole,
};

/// The two series an export will format, narrowed to their analysis periods.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledPair {
    pub natural: FlowSeries,
    pub altered: FlowSeries,
}

impl ReconciledPair {
    pub fn natural_period(&self) -> AnalysisPeriod {
        self.natural.period()
    }

    pub fn altered_period(&self) -> AnalysisPeriod {
        self.altered.period()
    }
}

/// Returns true when `period` spans at least `MIN_PERIOD_SPAN_YEARS`.
pub fn meets_minimum_span(period: AnalysisPeriod) -> bool {
    period.span() >= MIN_PERIOD_SPAN_YEARS
}

/// Checks both periods and reports every side that falls short.
pub fn check_periods(natural: AnalysisPeriod, altered: AnalysisPeriod) -> Result<()> {
    let shortfalls: Vec<PeriodShortfall> = [(SeriesRole::Natural, natural), (SeriesRole::Altered, altered)]
        .into_iter()
        .filter(|(_, p)| !meets_minimum_span(*p))
        .map(|(role, period)| PeriodShortfall { role, period, empty: false })
        .collect();

    if shortfalls.is_empty() {
        Ok(())
    } else {
        Err(ExportError::InsufficientPeriod { shortfalls })
    }
}

/// Narrows each series to its requested period (or keeps its full extent
/// when `None`) and checks both resulting periods.
///
/// The inputs are borrowed and left untouched, so a rejected attempt can be
/// retried with different periods without re-reading any source.
pub fn reconcile(
    natural: &FlowSeries,
    altered: &FlowSeries,
    natural_period: Option<AnalysisPeriod>,
    altered_period: Option<AnalysisPeriod>,
) -> Result<ReconciledPair> {
    let mut shortfalls = Vec::new();

    let natural = narrow(natural, natural_period, &mut shortfalls);
    let altered = narrow(altered, altered_period, &mut shortfalls);

    for series in [&natural, &altered].into_iter().flatten() {
        let period = series.period();
        if !meets_minimum_span(period) {
            shortfalls.push(PeriodShortfall { role: series.role(), period, empty: false });
        }
    }

    match (natural, altered) {
        (Some(natural), Some(altered)) if shortfalls.is_empty() => Ok(ReconciledPair { natural, altered }),
        _ => {
            shortfalls.sort_by_key(|s| s.role != SeriesRole::Natural);
            Err(ExportError::InsufficientPeriod { shortfalls })
        }
    }
}

fn narrow(
    series: &FlowSeries,
    period: Option<AnalysisPeriod>,
    shortfalls: &mut Vec<PeriodShortfall>,
) -> Option<FlowSeries> {
    let Some(period) = period else {
        return Some(series.clone());
    };

    let narrowed = series.within(period);
    if narrowed.is_none() {
        shortfalls.push(PeriodShortfall { role: series.role(), period, empty: true });
    }
    narrowed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Series validation.
//!
//! Every candidate series passes the same three checks, in order, whatever
//! its origin:
//!
//! 1. frequency   : consecutive dates exactly one day apart
//! 2. completeness: no missing discharge
//! 3. plausibility: finite, non-negative discharge
//!
//! The first failure rejects the whole series. Nothing is repaired; the
//! validator only inspects and either builds a `FlowSeries` or refuses.

use chrono::Duration;

use crate::model::{ExportError, FlowRecord, FlowSeries, RawRecord, RawSeries, Result, SeriesRole};

/// Validates a raw series and, on success, returns it as a `FlowSeries`.
pub fn validate_series(raw: RawSeries) -> Result<FlowSeries> {
    if raw.records.is_empty() {
        return Err(ExportError::InvalidData {
            role: raw.role,
            detail: "series contains no records".to_string(),
        });
    }

    check_frequency(raw.role, &raw.records)?;
    let records = check_discharge(raw.role, &raw.records)?;

    Ok(FlowSeries::from_validated(raw.role, raw.origin, raw.label, records))
}

/// Fails on the first pair of neighbours that are not one day apart.
pub fn check_frequency(role: SeriesRole, records: &[RawRecord]) -> Result<()> {
    for pair in records.windows(2) {
        let (prev, next) = (pair[0].date, pair[1].date);
        let step = next - prev;
        if step == Duration::days(1) {
            continue;
        }

        let detail = if step == Duration::zero() {
            format!("duplicate date {}", next)
        } else if step < Duration::zero() {
            format!("{} follows {} (dates out of order)", next, prev)
        } else {
            format!(
                "gap of {} days between {} and {}",
                step.num_days() - 1,
                prev,
                next
            )
        };
        return Err(ExportError::InvalidFrequency { role, detail });
    }
    Ok(())
}

/// Completeness then plausibility. Returns the records with discharge
/// unwrapped once both hold.
pub fn check_discharge(role: SeriesRole, records: &[RawRecord]) -> Result<Vec<FlowRecord>> {
    let missing: Vec<_> = records.iter().filter(|r| r.discharge.is_none()).collect();
    if let Some(first) = missing.first() {
        return Err(ExportError::InvalidData {
            role,
            detail: format!(
                "{} missing flow value(s), first on {}",
                missing.len(),
                first.date
            ),
        });
    }

    let accepted: Vec<FlowRecord> = records
        .iter()
        .filter_map(|r| r.discharge.map(|q| FlowRecord { date: r.date, discharge: q }))
        .collect();

    if let Some(FlowRecord { date, discharge: q }) = accepted.iter().find(|r| !r.discharge.is_finite()) {
        return Err(ExportError::InvalidData {
            role,
            detail: format!("non-finite flow value {} on {}", q, date),
        });
    }

    let negative: Vec<_> = accepted.iter().filter(|r| r.discharge < 0.0).collect();
    if let Some(FlowRecord { date, discharge: q }) = negative.first() {
        return Err(ExportError::InvalidData {
            role,
            detail: format!(
                "{} negative flow value(s), first {} on {}",
                negative.len(),
                q,
                date
            ),
        });
    }

    Ok(accepted)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

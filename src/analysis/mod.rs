/// Analysis-period checks for the natural/altered comparison.
///
/// Submodules:
/// - `period`: minimum-length reconciliation of the two analysis periods.
///
/// Hydrologic-alteration indicators themselves are computed by IAHRIS from
/// the exported files; nothing here derives statistics from flow values.

pub mod period;

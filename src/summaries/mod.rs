//! The five summary views over the reconciled model.
//!
//! Each builder is a pure function from [`ReconciledModel`](crate::metrics::ReconciledModel)
//! to an ordered row-set; none of them mutate shared state, so they can run
//! in any order (or concurrently) over the same model.

pub mod detail;
pub mod max_load;
pub mod on_time;
pub mod route_totals;
pub mod stop_totals;

#[cfg(test)]
pub(crate) mod testing;

pub use detail::DetailBlock;
pub use max_load::MaxLoadRow;
pub use on_time::OnTimeBlock;
pub use route_totals::RouteTotalsRow;
pub use stop_totals::StopTotalsRow;

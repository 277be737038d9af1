//! Dashboard analytics and resume comparison. Pure functions over records;
//! HTTP wiring lives in `handlers`.

pub mod aggregator;
pub mod comparison;
pub mod handlers;

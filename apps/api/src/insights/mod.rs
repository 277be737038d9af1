//! Per-resume follow-ups: which skills to add and which openings fit.

pub mod catalog;
pub mod handlers;
pub mod suggestions;

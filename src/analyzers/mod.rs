//! Aggregation engine for EV registration records.
//!
//! This module groups, bins, and averages a working set of records into
//! the distributions, rankings, comparison tables, and manufacturer
//! profiles the reports are built from. Every query is a pure function of
//! its inputs; a filter change derives a fresh working set instead of
//! mutating an existing one.

pub mod aggregate;
pub mod comparison;
pub mod profile;
pub mod reduce;
pub mod types;

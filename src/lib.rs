//! Convert loosely-structured SQL dump files into per-table CSV files, with
//! a separate best-effort repair pass for rows whose column count did not
//! match the inferred schema.

pub mod export;
pub mod index;
pub mod parse;
pub mod repair;
pub mod report;

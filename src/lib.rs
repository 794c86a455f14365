//! Subject browser core: load the subject database, narrow it with filters,
//! and derive audiograms and coupling recommendations for single subjects.

pub mod config;
pub mod data;
pub mod error;

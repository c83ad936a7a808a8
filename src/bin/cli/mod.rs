//! CLI module for Ada Babel
//!
//! Handles block input, option flags and result formatting

pub mod block;
pub mod output;

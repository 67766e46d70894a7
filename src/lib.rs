// Rarely: tell people how rare the thing they did today is.
//
// This is the library root. Each module corresponds to a stage of the
// submission pipeline or a service behind it.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod moderation;
pub mod output;
pub mod pipeline;
pub mod quality;
pub mod rate_limit;
pub mod scoring;
pub mod toxicity;
pub mod trends;

#[cfg(feature = "web")]
pub mod web;

//! Core domain types and logic.

pub mod asset;
pub mod atr;
pub mod bar;
pub mod calendar;
pub mod correlation;
pub mod error;
pub mod feed_registry;
pub mod normalize;
pub mod portfolio;
pub mod price;
pub mod resample;
pub mod resolution;
pub mod series;
pub mod strategy;
pub mod trailing_stop;

pub mod api;
pub mod calculators;
pub mod core;

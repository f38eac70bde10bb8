pub mod algorithm;
pub mod common;
pub mod config;
pub mod map;
pub mod planner;
pub mod stat;

#[cfg(test)]
pub(crate) mod test_utils;

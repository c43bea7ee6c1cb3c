pub mod analyzers;
pub mod config;
pub mod delivery;
pub mod error;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod records;
pub mod report;

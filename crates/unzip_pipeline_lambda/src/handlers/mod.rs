pub mod aggregator;
pub mod trigger;
pub mod worker;

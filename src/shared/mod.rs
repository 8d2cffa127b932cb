pub mod counts;
pub mod errors;
pub mod paths;
pub mod tags;

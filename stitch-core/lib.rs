pub mod line_ending;
pub mod region;
pub mod search;

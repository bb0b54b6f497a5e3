use smartstring::{LazyCompact, SmartString};

pub mod merge;
pub mod source;

pub type Tendril = SmartString<LazyCompact>;

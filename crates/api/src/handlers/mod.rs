pub mod completions;
pub mod daily;
pub mod due;
pub mod stats;

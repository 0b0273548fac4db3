pub mod file_ops;
pub mod splitter;

pub use file_ops::*;
pub use splitter::{find_keyword, find_top_level_char, split_top_level};

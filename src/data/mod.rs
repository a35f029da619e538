pub mod example;
pub mod idx;

pub use example::{check_dimension, input_dimension, Example};
pub use idx::{load_examples, parse_examples, read_idx, write_idx, IdxArray};

pub mod labeling;
pub mod stats;
pub mod utils;

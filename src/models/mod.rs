pub mod modernbert;

pub use modernbert::{ModernBertClassifier, ModernBertZeroShot};

// Signal generation and next-session prediction
pub mod predictor;
pub mod signals;

pub use predictor::DirectionalPredictor;
pub use signals::{SignalBar, SignalGenerator};

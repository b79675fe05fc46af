pub mod enhancement;
pub mod ledger;
pub mod metrics;
pub mod round_trip;
pub mod runner;
pub mod synthetic;

pub use enhancement::{EnhancementRow, EnhancementSimulator};
pub use ledger::{Ledger, LedgerRow, LOT_SIZE};
pub use metrics::{MetricsEngine, PerformanceMetrics, RoundTripSummary};
pub use round_trip::{simulate_session, RoundTripSimulator};
pub use runner::{BacktestRunner, EnhancementReport, RoundTripReport};
pub use synthetic::{MarketScenario, SyntheticDataGenerator};

use crate::error::EnhancerError;
use crate::models::Regime;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "holding-enhancer";
const ENV_PREFIX: &str = "ENHANCER";

/// Top-level configuration
///
/// Layered as built-in defaults, then an optional TOML file, then
/// `ENHANCER__<SECTION>__<KEY>` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnhancerConfig {
    pub data: DataConfig,
    pub regime: RegimeConfig,
    pub signals: SignalConfig,
    pub predictor: PredictorConfig,
    pub round_trip: RoundTripConfig,
    pub enhancement: EnhancementConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Csv,
    Yahoo,
    Synthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub symbol: String,
    pub index_symbol: String,
    pub lookback_days: i64,
    pub source: DataSourceKind,
    pub csv_dir: PathBuf,
    pub yahoo_base_url: String,
    pub requests_per_minute: u32,
    /// Seed of the synthetic source, independent of the enhancement draws
    pub synthetic_seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbol: "600519.SS".to_string(),
            index_symbol: "000300.SS".to_string(),
            lookback_days: 730,
            source: DataSourceKind::Csv,
            csv_dir: PathBuf::from("data"),
            yahoo_base_url: "https://query2.finance.yahoo.com".to_string(),
            requests_per_minute: 30,
            synthetic_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegimeConfig {
    /// Lookback for index/stock averages, return volatility and volume average
    pub window: usize,
    /// Window of the volatility baseline the current volatility is compared against
    pub volatility_baseline_window: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            window: 20,
            volatility_baseline_window: 60,
        }
    }
}

/// Share of the position used for round trips in each regime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PositionFractions {
    pub risk_on: f64,
    pub volatile: f64,
    pub risk_off: f64,
    pub low_liquidity: f64,
}

impl Default for PositionFractions {
    fn default() -> Self {
        Self {
            risk_on: 0.2,  // Trending up: small slice, easy to sell too early
            volatile: 0.5, // Choppy: best environment for round trips
            risk_off: 0.8,
            low_liquidity: 0.0,
        }
    }
}

impl PositionFractions {
    pub fn fraction_for(&self, regime: Regime) -> f64 {
        match regime {
            Regime::RiskOn => self.risk_on,
            Regime::Volatile => self.volatile,
            Regime::RiskOff => self.risk_off,
            Regime::LowLiquidity => self.low_liquidity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub band_window: usize,
    /// Band half-width in standard deviations
    pub band_width: f64,
    pub position_fractions: PositionFractions,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            band_window: 20,
            band_width: 2.0,
            position_fractions: PositionFractions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
    pub short_period: usize,
    pub long_period: usize,
    pub atr_period: usize,
    /// Distance of the buy/sell targets from the last close, in ATRs
    pub atr_band_multiplier: f64,
    pub min_daily_bars: usize,
    pub min_weekly_bars: usize,
    pub min_monthly_bars: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            short_period: 5,
            long_period: 20,
            atr_period: 14,
            atr_band_multiplier: 0.25,
            min_daily_bars: 20,
            min_weekly_bars: 5,
            min_monthly_bars: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoundTripConfig {
    pub initial_shares: u32,
    /// Fee per leg as a fraction of notional
    pub fee: f64,
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self {
            initial_shares: 100,
            fee: 0.0002,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WinProbabilities {
    pub volatile: f64,
    pub risk_off: f64,
    pub risk_on: f64,
    pub default: f64,
}

impl Default for WinProbabilities {
    fn default() -> Self {
        Self {
            volatile: 0.7,
            risk_off: 0.6,
            risk_on: 0.4,
            default: 0.5,
        }
    }
}

impl WinProbabilities {
    pub fn for_regime(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Volatile => self.volatile,
            Regime::RiskOff => self.risk_off,
            Regime::RiskOn => self.risk_on,
            Regime::LowLiquidity => self.default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnhancementConfig {
    /// One-way transaction cost, charged twice per round trip
    pub transaction_cost: f64,
    /// Seed of the win/loss draw sequence; fixed so runs are reproducible
    pub seed: u64,
    /// Share of the day's amplitude captured on a win
    pub win_capture: f64,
    /// Share of the day's amplitude lost on a loss
    pub loss_capture: f64,
    pub win_probabilities: WinProbabilities,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            transaction_cost: 0.0005,
            seed: 42,
            win_capture: 0.3,
            loss_capture: 0.2,
            win_probabilities: WinProbabilities::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: 252.0,
        }
    }
}

impl EnhancerConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// Without an explicit path, `holding-enhancer.toml` in the working directory
    /// is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, EnhancerError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EnhancerConfig = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Reject settings that would make the rolling computations or the ledger meaningless
    pub fn validate(&self) -> Result<(), EnhancerError> {
        let windows = [
            ("regime.window", self.regime.window),
            (
                "regime.volatility_baseline_window",
                self.regime.volatility_baseline_window,
            ),
            ("signals.band_window", self.signals.band_window),
            ("predictor.short_period", self.predictor.short_period),
            ("predictor.long_period", self.predictor.long_period),
            ("predictor.atr_period", self.predictor.atr_period),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(EnhancerError::InvalidConfig(format!(
                    "{} must be positive",
                    name
                )));
            }
        }

        let fractions = self.signals.position_fractions;
        for regime in Regime::ALL {
            let fraction = fractions.fraction_for(regime);
            if !(0.0..=1.0).contains(&fraction) {
                return Err(EnhancerError::InvalidConfig(format!(
                    "position fraction for {} must be within [0, 1], got {}",
                    regime, fraction
                )));
            }

            let probability = self.enhancement.win_probabilities.for_regime(regime);
            if !(0.0..=1.0).contains(&probability) {
                return Err(EnhancerError::InvalidConfig(format!(
                    "win probability for {} must be within [0, 1], got {}",
                    regime, probability
                )));
            }
        }

        if self.round_trip.fee < 0.0 || self.enhancement.transaction_cost < 0.0 {
            return Err(EnhancerError::InvalidConfig(
                "fees must not be negative".to_string(),
            ));
        }

        if self.round_trip.initial_shares == 0 {
            return Err(EnhancerError::InvalidConfig(
                "round_trip.initial_shares must be positive".to_string(),
            ));
        }

        if self.metrics.periods_per_year <= 0.0 {
            return Err(EnhancerError::InvalidConfig(
                "metrics.periods_per_year must be positive".to_string(),
            ));
        }

        if self.data.lookback_days <= 0 {
            return Err(EnhancerError::InvalidConfig(
                "data.lookback_days must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EnhancerConfig::default();

        assert_eq!(config.regime.window, 20);
        assert_eq!(config.regime.volatility_baseline_window, 60);
        assert_eq!(config.predictor.atr_period, 14);
        assert_eq!(config.round_trip.fee, 0.0002);
        assert_eq!(config.enhancement.seed, 42);
        assert_eq!(config.data.synthetic_seed, 42);
        assert_eq!(config.metrics.risk_free_rate, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_position_fraction_lookup() {
        let fractions = PositionFractions::default();

        assert_eq!(fractions.fraction_for(Regime::RiskOn), 0.2);
        assert_eq!(fractions.fraction_for(Regime::Volatile), 0.5);
        assert_eq!(fractions.fraction_for(Regime::RiskOff), 0.8);
        assert_eq!(fractions.fraction_for(Regime::LowLiquidity), 0.0);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[data]\nsynthetic_seed = 7\n\n[round_trip]\nfee = 0.0005\n\n[signals.position_fractions]\nvolatile = 0.4"
        )
        .unwrap();

        let config = EnhancerConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.round_trip.fee, 0.0005);
        assert_eq!(config.round_trip.initial_shares, 100);
        assert_eq!(config.signals.position_fractions.volatile, 0.4);
        assert_eq!(config.signals.position_fractions.risk_off, 0.8);
        // The synthetic data seed moves on its own
        assert_eq!(config.data.synthetic_seed, 7);
        assert_eq!(config.enhancement.seed, 42);
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let mut config = EnhancerConfig::default();
        config.signals.position_fractions.risk_off = 1.5;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Risk-Off"));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = EnhancerConfig::default();
        config.regime.window = 0;

        assert!(config.validate().is_err());
    }
}

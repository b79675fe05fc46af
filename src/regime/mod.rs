// Market regime classification module
pub mod classifier;

pub use classifier::{
    classify_bar, regime_distribution, ClassifiedBar, RegimeClassifier, RegimeFeatures,
    RuleContext,
};

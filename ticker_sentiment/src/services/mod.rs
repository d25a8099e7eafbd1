pub mod analysis;
pub mod collector;
pub mod decision;
pub mod model;
pub mod processor;

pub use analysis::SentimentAnalysisService;
pub use collector::NewsCollectorService;
pub use decision::{aggregate, aggregate_articles, aggregate_with, threshold_label, ThresholdPolicy};
pub use model::{build_model, ClassProbabilities, HuggingFaceModel, LexiconModel, SentimentModel};
pub use processor::{SentimentClassifier, TextNormalizer};

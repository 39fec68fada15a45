mod asset;
mod daily_index;
mod prediction;
mod price_snapshot;

pub use asset::{AssetId, PriceSource, TrackedAsset};
pub use daily_index::{AssetStats, DailyIndexPoint};
pub use prediction::{
    Direction, NewPrediction, Prediction, PredictionInput, PredictionListing, PredictionWithPrice,
    SetResult, SetResultInput,
};
pub use price_snapshot::{PriceSnapshot, RefreshSummary};

pub mod market;
pub mod price_series;
pub mod recommendation;

pub use market::{NewsArticle, TickerMatch, UNKNOWN_SECTOR};
pub use price_series::{AnalysisWindow, PriceSeries};
pub use recommendation::{AnalysisResult, Extremes, PeerComparison, PricePoint, Recommendation};

use serde::Serialize;

/// Where the latest price for an asset comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource<'a> {
    Yahoo(&'a str),
    CoinGecko(&'a str),
}

// The fixed set of markets every prediction dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TrackedAsset {
    Sp500,
    Nasdaq,
    Kospi,
    Kosdaq,
    Bitcoin,
    UsdKrw,
    Gold,
    Silver,
}

impl TrackedAsset {
    pub const ALL: [TrackedAsset; 8] = [
        TrackedAsset::Sp500,
        TrackedAsset::Nasdaq,
        TrackedAsset::Kospi,
        TrackedAsset::Kosdaq,
        TrackedAsset::Bitcoin,
        TrackedAsset::UsdKrw,
        TrackedAsset::Gold,
        TrackedAsset::Silver,
    ];

    /// The name stored in `predictions.asset_market` and `prices.asset_market`.
    pub fn display_name(&self) -> &'static str {
        match self {
            TrackedAsset::Sp500 => "S&P500",
            TrackedAsset::Nasdaq => "NASDAQ",
            TrackedAsset::Kospi => "KOSPI",
            TrackedAsset::Kosdaq => "KOSDAQ",
            TrackedAsset::Bitcoin => "비트코인",
            TrackedAsset::UsdKrw => "환율(원/달러)",
            TrackedAsset::Gold => "금",
            TrackedAsset::Silver => "은",
        }
    }

    pub fn price_source(&self) -> PriceSource<'static> {
        match self {
            TrackedAsset::Sp500 => PriceSource::Yahoo("^GSPC"),
            TrackedAsset::Nasdaq => PriceSource::Yahoo("^IXIC"),
            TrackedAsset::Kospi => PriceSource::Yahoo("^KS11"),
            TrackedAsset::Kosdaq => PriceSource::Yahoo("^KQ11"),
            TrackedAsset::Bitcoin => PriceSource::CoinGecko("bitcoin"),
            TrackedAsset::UsdKrw => PriceSource::Yahoo("KRW=X"),
            TrackedAsset::Gold => PriceSource::Yahoo("GC=F"),
            TrackedAsset::Silver => PriceSource::Yahoo("SI=F"),
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.display_name() == name)
    }

    pub fn display_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|a| a.display_name()).collect()
    }
}

/// Identifies what a prediction is about: one of the tracked markets, or an
/// individual security named freely (optionally with an explicit ticker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetId {
    Tracked(TrackedAsset),
    Custom { name: String, ticker: Option<String> },
}

impl AssetId {
    pub fn resolve(asset_market: &str, ticker: Option<&str>) -> Self {
        match TrackedAsset::from_display_name(asset_market) {
            Some(asset) => AssetId::Tracked(asset),
            None => AssetId::Custom {
                name: asset_market.to_string(),
                ticker: ticker.map(str::to_string),
            },
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AssetId::Tracked(asset) => asset.display_name(),
            AssetId::Custom { name, .. } => name,
        }
    }

    /// Symbol to ask a price provider for. Custom assets without an explicit
    /// ticker are looked up by their display name.
    pub fn price_source(&self) -> PriceSource<'_> {
        match self {
            AssetId::Tracked(asset) => asset.price_source(),
            AssetId::Custom { name, ticker } => PriceSource::Yahoo(ticker.as_deref().unwrap_or(name)),
        }
    }
}

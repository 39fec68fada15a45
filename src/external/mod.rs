pub mod coingecko;
pub mod multi_provider;
pub mod notifier;
pub mod price_provider;
pub mod telegram;
pub mod yahoo;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TraderListing {
    pub traders: Vec<String>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedTrader {
    pub trader_id: String,
    pub status: String,
}

//! Data source identities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed set of upstream data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// EDINET securities filings (FSA)
    Edinet,
    /// TDnet timely disclosures (JPX)
    Tdnet,
    /// e-Stat government statistics
    Estat,
    /// Bank of Japan time-series statistics
    Boj,
    /// Financial news headlines
    News,
    /// Daily stock prices
    StockPrice,
}

impl SourceId {
    /// Every source, in canonical order
    pub const ALL: [SourceId; 6] = [
        SourceId::Edinet,
        SourceId::Tdnet,
        SourceId::Estat,
        SourceId::Boj,
        SourceId::News,
        SourceId::StockPrice,
    ];

    /// Machine-readable name, as used in JSON and configuration
    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Edinet => "edinet",
            SourceId::Tdnet => "tdnet",
            SourceId::Estat => "estat",
            SourceId::Boj => "boj",
            SourceId::News => "news",
            SourceId::StockPrice => "stock_price",
        }
    }

    /// Name for human-readable output
    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::Edinet => "EDINET",
            SourceId::Tdnet => "TDnet",
            SourceId::Estat => "e-Stat",
            SourceId::Boj => "BOJ",
            SourceId::News => "News",
            SourceId::StockPrice => "Stock price",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "edinet" => Ok(SourceId::Edinet),
            "tdnet" => Ok(SourceId::Tdnet),
            "estat" | "e_stat" => Ok(SourceId::Estat),
            "boj" => Ok(SourceId::Boj),
            "news" => Ok(SourceId::News),
            "stock_price" | "stock" | "stockprice" | "yfinance" => Ok(SourceId::StockPrice),
            other => Err(format!("unknown data source: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_str() {
        for source in SourceId::ALL {
            assert_eq!(source.as_str().parse::<SourceId>().unwrap(), source);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("e-Stat".parse::<SourceId>().unwrap(), SourceId::Estat);
        assert_eq!("stock".parse::<SourceId>().unwrap(), SourceId::StockPrice);
        assert!("bloomberg".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        let json = serde_json::to_string(&SourceId::StockPrice).unwrap();
        assert_eq!(json, "\"stock_price\"");
    }
}

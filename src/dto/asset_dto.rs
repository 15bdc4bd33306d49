use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The five draftable categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AssetType {
    Manufacturer,
    CannabisStrain,
    Product,
    Pharmacy,
    Brand,
}

impl AssetType {
    pub const ALL: [AssetType; 5] = [
        AssetType::Manufacturer,
        AssetType::CannabisStrain,
        AssetType::Product,
        AssetType::Pharmacy,
        AssetType::Brand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Manufacturer => "manufacturer",
            AssetType::CannabisStrain => "cannabis_strain",
            AssetType::Product => "product",
            AssetType::Pharmacy => "pharmacy",
            AssetType::Brand => "brand",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAssetType(pub String);

impl fmt::Display for UnknownAssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown asset type '{}'", self.0)
    }
}

impl FromStr for AssetType {
    type Err = UnknownAssetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| UnknownAssetType(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Asset {
    pub asset_type: AssetType,
    pub id: i64,
    pub name: String,
}

/// Catalog import payload.
#[derive(Debug, Deserialize)]
pub struct NewAsset {
    pub asset_type: AssetType,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailableAssetsQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("cannabis_strain".parse::<AssetType>(), Ok(AssetType::CannabisStrain));
        assert_eq!("pharmacy".parse::<AssetType>(), Ok(AssetType::Pharmacy));
        assert!("retail".parse::<AssetType>().is_err());
    }

    #[test]
    fn serde_matches_display() {
        for t in AssetType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{t}\""));
        }
    }
}

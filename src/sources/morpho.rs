//! Morpho vault reads through the public GraphQL API.

use std::str::FromStr;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{AdapterConfig, SourceKind, TrackedEntity};
use crate::errors::FetchError;
use crate::metrics::calculator::{fraction_to_percent, scale_fixed_point};
use crate::metrics::{EntityKind, Reading};
use crate::sources::{http, SourceAdapter};

const VAULT_QUERY: &str = r#"
query VaultLiquidity($address: String!, $chainId: Int!) {
  vaultByAddress(address: $address, chainId: $chainId) {
    address
    name
    state {
      totalAssets
      netApy
      apy
      allocation {
        supplyAssets
        market {
          uniqueKey
          state {
            supplyAssets
            borrowAssets
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VaultVariables<'a> {
    address: &'a str,
    chain_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    data: Option<VaultData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaultData {
    vault_by_address: Option<Vault>,
}

#[derive(Debug, Deserialize)]
struct Vault {
    #[serde(default)]
    name: Option<String>,
    state: Option<VaultState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaultState {
    total_assets: Amount,
    #[serde(default)]
    net_apy: Option<f64>,
    #[serde(default)]
    apy: Option<f64>,
    #[serde(default)]
    allocation: Vec<Allocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Allocation {
    supply_assets: Amount,
    market: Option<Market>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Market {
    #[serde(default)]
    unique_key: Option<String>,
    state: Option<MarketState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketState {
    supply_assets: Amount,
    borrow_assets: Amount,
}

/// BigInt amounts arrive as JSON numbers or strings. The number text is kept
/// verbatim (`arbitrary_precision`) so values above `u64` stay exact.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
struct Amount(Value);

impl Amount {
    fn to_u256(&self, field: &'static str) -> Result<U256, FetchError> {
        let invalid = || FetchError::InvalidValue {
            field,
            value: self.0.to_string(),
        };
        let text = match &self.0 {
            Value::Number(number) => number.to_string(),
            Value::String(text) => text.trim().to_string(),
            _ => return Err(invalid()),
        };
        parse_integer_amount(&text).ok_or_else(invalid)
    }
}

/// Exact integer text, optionally with a zero fraction (`"12.000"`). Anything
/// else goes through Decimal and is truncated toward zero.
fn parse_integer_amount(text: &str) -> Option<U256> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let plain = !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b == b'0');
    if plain {
        return U256::from_str(whole).ok();
    }
    let value = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()?;
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    U256::from_str(&value.trunc().to_string()).ok()
}

impl GraphQlResponse {
    pub fn into_reading(self, entity: &TrackedEntity, decimals: u8) -> Result<Reading, FetchError> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::GraphQl(messages.join("; ")));
        }
        let vault = self
            .data
            .and_then(|data| data.vault_by_address)
            .ok_or_else(|| FetchError::Missing(format!("vault {} not found", entity.id)))?;
        let state = vault
            .state
            .ok_or_else(|| FetchError::Missing(format!("vault {} has no state", entity.id)))?;

        let total = state.total_assets.to_u256("totalAssets")?;
        let mut available = U256::ZERO;
        for allocation in &state.allocation {
            let Some(market_state) = allocation.market.as_ref().and_then(|m| m.state.as_ref())
            else {
                continue;
            };
            let market_liquidity = market_state
                .supply_assets
                .to_u256("market.supplyAssets")?
                .saturating_sub(market_state.borrow_assets.to_u256("market.borrowAssets")?);
            let vault_supply = allocation.supply_assets.to_u256("allocation.supplyAssets")?;
            let withdrawable = market_liquidity.min(vault_supply);
            debug!(
                market = allocation
                    .market
                    .as_ref()
                    .and_then(|m| m.unique_key.as_deref())
                    .unwrap_or("unknown"),
                %withdrawable,
                "allocation"
            );
            available = available.saturating_add(withdrawable);
        }
        let deployed = total.saturating_sub(available);

        let apy_fraction = state
            .net_apy
            .filter(|apy| *apy != 0.0)
            .or(state.apy)
            .unwrap_or(0.0);
        let apy_fraction = Decimal::try_from(apy_fraction).map_err(|_| FetchError::InvalidValue {
            field: "netApy",
            value: apy_fraction.to_string(),
        })?;

        let display_name = if entity.name.is_empty() {
            vault.name.unwrap_or_else(|| entity.id.clone())
        } else {
            entity.name.clone()
        };

        Ok(Reading::new(entity.id.clone(), display_name, EntityKind::Vault)
            .with_liquidity(
                scale_fixed_point(total, decimals)?,
                scale_fixed_point(available, decimals)?,
                scale_fixed_point(deployed, decimals)?,
            )
            .with_apy(fraction_to_percent(apy_fraction))
            .observed_at(Utc::now()))
    }
}

pub struct MorphoSource {
    api_url: String,
}

impl MorphoSource {
    pub fn new(api_url: String) -> Self {
        Self { api_url }
    }
}

#[async_trait]
impl SourceAdapter for MorphoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Morpho
    }

    async fn fetch(&self, entity: &TrackedEntity) -> Result<Reading, FetchError> {
        let AdapterConfig::Morpho {
            vault,
            chain_id,
            decimals,
        } = &entity.adapter
        else {
            return Err(FetchError::NoAdapter(entity.adapter.source().as_slug().to_string()));
        };
        let address = vault.trim().to_lowercase();
        let body = json!({
            "query": VAULT_QUERY,
            "variables": VaultVariables {
                address: &address,
                chain_id: *chain_id,
            },
        });
        debug!(vault = %address, chain_id, url = %self.api_url, "querying vault");
        let response: GraphQlResponse = http::post_json(&self.api_url, &body).await?;
        response.into_reading(entity, *decimals)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn entity() -> TrackedEntity {
        TrackedEntity {
            id: "gauntlet-usdc".to_string(),
            name: "Gauntlet USDC Prime".to_string(),
            adapter: AdapterConfig::Morpho {
                vault: "0xeE8F4eC5672F09119b96Ab6fB59C27E1b7e44b61".to_string(),
                chain_id: 8453,
                decimals: 6,
            },
        }
    }

    fn parse(raw: &str) -> GraphQlResponse {
        serde_json::from_str(raw).expect("fixture parses")
    }

    #[test]
    fn available_is_bounded_by_market_and_allocation() {
        let response = parse(
            r#"{
              "data": {
                "vaultByAddress": {
                  "address": "0xee8f",
                  "name": "Gauntlet USDC Prime",
                  "state": {
                    "totalAssets": "1000000000000",
                    "netApy": 0.0512,
                    "apy": 0.05,
                    "allocation": [
                      {
                        "supplyAssets": 600000000000,
                        "market": {
                          "uniqueKey": "0xaa",
                          "state": { "supplyAssets": 2000000000000, "borrowAssets": 1950000000000 }
                        }
                      },
                      {
                        "supplyAssets": "400000000000",
                        "market": {
                          "uniqueKey": "0xbb",
                          "state": { "supplyAssets": "900000000000", "borrowAssets": "100000000000" }
                        }
                      },
                      {
                        "supplyAssets": 10,
                        "market": { "uniqueKey": "0xcc", "state": null }
                      }
                    ]
                  }
                }
              }
            }"#,
        );
        let reading = response.into_reading(&entity(), 6).expect("reading");
        assert_eq!(reading.kind, EntityKind::Vault);
        assert_eq!(reading.total_liquidity, dec!(1000000));
        // 50_000 from the tight market plus the whole 400_000 allocation
        assert_eq!(reading.available_liquidity, dec!(450000));
        assert_eq!(reading.total_debt, dec!(550000));
        assert_eq!(reading.supply_apy_percent, dec!(5.12));
    }

    #[test]
    fn overborrowed_market_contributes_nothing() {
        let response = parse(
            r#"{"data":{"vaultByAddress":{"name":"x","state":{
                "totalAssets": 100000000,
                "netApy": null,
                "apy": 0.03,
                "allocation": [{"supplyAssets": 100000000,
                  "market": {"state": {"supplyAssets": 5, "borrowAssets": 9}}}]
            }}}}"#,
        );
        let reading = response.into_reading(&entity(), 6).expect("reading");
        assert_eq!(reading.available_liquidity, dec!(0));
        assert_eq!(reading.total_debt, dec!(100));
        assert_eq!(reading.supply_apy_percent, dec!(3));
    }

    #[test]
    fn graphql_errors_are_reported() {
        let response = parse(r#"{"data":null,"errors":[{"message":"rate limited"}]}"#);
        let err = response.into_reading(&entity(), 6).expect_err("errors");
        assert!(matches!(err, FetchError::GraphQl(ref msg) if msg.contains("rate limited")));
    }

    #[test]
    fn missing_vault_is_reported() {
        let response = parse(r#"{"data":{"vaultByAddress":null}}"#);
        let err = response.into_reading(&entity(), 6).expect_err("missing");
        assert!(matches!(err, FetchError::Missing(_)));
    }

    #[test]
    fn amounts_above_u64_stay_exact() {
        let response = parse(
            r#"{"data":{"vaultByAddress":{"state":{
                "totalAssets": 1234567890123456789012345,
                "apy": 0.01,
                "allocation": [{"supplyAssets": "1234567890123456789012345",
                  "market": {"state": {
                    "supplyAssets": 2000000000000000000000000,
                    "borrowAssets": 1000000000000000000000001}}}]
            }}}}"#,
        );
        let reading = response.into_reading(&entity(), 18).expect("reading");
        assert_eq!(reading.total_liquidity, dec!(1234567.890123456789012345));
        assert_eq!(reading.available_liquidity, dec!(999999.999999999999999999));
        assert_eq!(reading.total_debt, dec!(234567.890123456789012346));
    }

    #[test]
    fn integer_amount_parsing() {
        assert_eq!(
            parse_integer_amount("1234567890123456789012345"),
            Some(U256::from(1_234_567_890_123_456_789_012_345u128))
        );
        assert_eq!(parse_integer_amount("42.000"), Some(U256::from(42u8)));
        assert_eq!(parse_integer_amount("42.9"), Some(U256::from(42u8)));
        assert_eq!(parse_integer_amount("1e3"), Some(U256::from(1000u16)));
        assert_eq!(parse_integer_amount("-5"), None);
        assert_eq!(parse_integer_amount("abc"), None);
    }

    #[test]
    fn missing_apy_means_zero() {
        let response = parse(
            r#"{"data":{"vaultByAddress":{"state":{"totalAssets":"0","allocation":[]}}}}"#,
        );
        let reading = response.into_reading(&entity(), 6).expect("reading");
        assert_eq!(reading.supply_apy_percent, dec!(0));
        assert_eq!(reading.total_liquidity, dec!(0));
    }
}

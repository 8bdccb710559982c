//! AAVE V3 reserve reads over JSON-RPC.
//!
//! One `Pool.getReserveData` call locates the reserve's token contracts, then
//! the aToken supply, both debt token supplies and the underlying balance held
//! by the aToken are read concurrently and assembled into a single reading.

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::config::{AdapterConfig, SourceKind, TrackedEntity};
use crate::errors::{ConfigError, FetchError};
use crate::metrics::calculator::{ray_rate_to_apy, scale_fixed_point};
use crate::metrics::{EntityKind, Reading};
use crate::sources::contracts::{IERC20, IPool};
use crate::sources::SourceAdapter;

pub type HttpProvider = RootProvider;

/// Raw on-chain figures for one reserve, before scaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub liquidity_rate_ray: U256,
    pub a_token_supply: U256,
    pub variable_debt: U256,
    pub stable_debt: U256,
    pub available: U256,
    pub decimals: u8,
}

impl ReserveSnapshot {
    pub fn into_reading(self, entity: &TrackedEntity) -> Result<Reading, FetchError> {
        let total_debt = self.variable_debt.saturating_add(self.stable_debt);
        Ok(
            Reading::new(entity.id.clone(), entity.name.clone(), EntityKind::Reserve)
                .with_liquidity(
                    scale_fixed_point(self.a_token_supply, self.decimals)?,
                    scale_fixed_point(self.available, self.decimals)?,
                    scale_fixed_point(total_debt, self.decimals)?,
                )
                .with_apy(ray_rate_to_apy(self.liquidity_rate_ray)?)
                .observed_at(Utc::now()),
        )
    }
}

pub struct AaveSource {
    provider: HttpProvider,
}

fn rpc_error(call: &'static str) -> impl FnOnce(alloy::contract::Error) -> FetchError {
    move |e| FetchError::Rpc {
        call,
        reason: e.to_string(),
    }
}

impl AaveSource {
    pub fn connect(rpc_url: &str) -> Result<Self, ConfigError> {
        let url: Url = rpc_url
            .trim()
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid rpc url {rpc_url}: {e}")))?;
        Ok(Self::new(RootProvider::new_http(url)))
    }

    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }

    pub async fn chain_id(&self) -> Result<u64, FetchError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| FetchError::Rpc {
                call: "eth_chainId",
                reason: e.to_string(),
            })
    }

    /// Size in bytes of the deployed code at `address`; zero means no contract.
    pub async fn code_size(&self, address: Address) -> Result<usize, FetchError> {
        self.provider
            .get_code_at(address)
            .await
            .map(|code| code.len())
            .map_err(|e| FetchError::Rpc {
                call: "eth_getCode",
                reason: e.to_string(),
            })
    }

    pub async fn read_reserve(
        &self,
        pool: Address,
        asset: Address,
        decimals: Option<u8>,
    ) -> Result<ReserveSnapshot, FetchError> {
        let pool = IPool::new(pool, self.provider.clone());
        let reserve = pool
            .getReserveData(asset)
            .call()
            .await
            .map_err(rpc_error("Pool.getReserveData"))?;

        let a_token = IERC20::new(reserve.aTokenAddress, self.provider.clone());
        let variable_debt_token =
            IERC20::new(reserve.variableDebtTokenAddress, self.provider.clone());
        let stable_debt_token = IERC20::new(reserve.stableDebtTokenAddress, self.provider.clone());
        let underlying = IERC20::new(asset, self.provider.clone());
        let has_stable_debt_token = reserve.stableDebtTokenAddress != Address::ZERO;

        let (a_token_supply, variable_debt, stable_debt, available, decimals) = tokio::try_join!(
            async {
                a_token
                    .totalSupply()
                    .call()
                    .await
                    .map_err(rpc_error("aToken.totalSupply"))
            },
            async {
                variable_debt_token
                    .totalSupply()
                    .call()
                    .await
                    .map_err(rpc_error("variableDebtToken.totalSupply"))
            },
            async {
                // stable borrowing is removed on newer deployments
                if !has_stable_debt_token {
                    return Ok(U256::ZERO);
                }
                stable_debt_token
                    .totalSupply()
                    .call()
                    .await
                    .map_err(rpc_error("stableDebtToken.totalSupply"))
            },
            async {
                underlying
                    .balanceOf(reserve.aTokenAddress)
                    .call()
                    .await
                    .map_err(rpc_error("asset.balanceOf"))
            },
            async {
                match decimals {
                    Some(value) => Ok(value),
                    None => underlying
                        .decimals()
                        .call()
                        .await
                        .map_err(rpc_error("asset.decimals")),
                }
            },
        )?;

        let snapshot = ReserveSnapshot {
            liquidity_rate_ray: U256::from(reserve.currentLiquidityRate),
            a_token_supply,
            variable_debt,
            stable_debt,
            available,
            decimals,
        };
        debug!(
            asset = %asset,
            a_token = %reserve.aTokenAddress,
            supply = %snapshot.a_token_supply,
            variable_debt = %snapshot.variable_debt,
            stable_debt = %snapshot.stable_debt,
            available = %snapshot.available,
            "reserve data"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl SourceAdapter for AaveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Aave
    }

    async fn fetch(&self, entity: &TrackedEntity) -> Result<Reading, FetchError> {
        let AdapterConfig::Aave {
            pool,
            asset,
            decimals,
        } = &entity.adapter
        else {
            return Err(FetchError::NoAdapter(entity.adapter.source().as_slug().to_string()));
        };
        let pool = parse_address("pool", pool)?;
        let asset = parse_address("asset", asset)?;
        let snapshot = self.read_reserve(pool, asset, *decimals).await?;
        snapshot.into_reading(entity)
    }
}

fn parse_address(field: &'static str, raw: &str) -> Result<Address, FetchError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| FetchError::InvalidValue {
            field,
            value: raw.to_string(),
        })
}

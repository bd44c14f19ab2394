//! Swap route request and quote types.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_TOKEN_DECIMALS;
use crate::errors::LeverageError;

/// Token descriptor handed to the route resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub address: Address,
    pub decimals: u8,
}

impl Asset {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self { address, decimals }
    }

    /// Reject the zero address and decimal counts no U256 amount can carry.
    pub fn validate(&self) -> Result<(), LeverageError> {
        if self.address.is_zero() {
            return Err(LeverageError::InvalidAsset {
                reason: "zero address".into(),
            });
        }
        if self.decimals > MAX_TOKEN_DECIMALS {
            return Err(LeverageError::InvalidAsset {
                reason: format!(
                    "{} decimals for {:#x} (max {MAX_TOKEN_DECIMALS})",
                    self.decimals, self.address
                ),
            });
        }
        Ok(())
    }
}

/// Exact-input route request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub amount_in: U256,
    pub token_in: Asset,
    pub token_out: Asset,
}

/// A single pool crossed by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub pool: Address,
    /// Pool fee in hundredths of a bip (3000 = 0.3%).
    pub fee: u32,
}

/// Resolved multi-hop route with its quoted output.
///
/// `hops[i]` connects `token_path[i]` to `token_path[i + 1]`. Deserialized
/// values go through [`RouteQuote::new`] and are checked the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRouteQuote")]
pub struct RouteQuote {
    hops: Vec<Hop>,
    token_path: Vec<Address>,
    output_amount: U256,
}

#[derive(Deserialize)]
struct RawRouteQuote {
    hops: Vec<Hop>,
    token_path: Vec<Address>,
    output_amount: U256,
}

impl TryFrom<RawRouteQuote> for RouteQuote {
    type Error = LeverageError;

    fn try_from(raw: RawRouteQuote) -> Result<Self, Self::Error> {
        Self::new(raw.hops, raw.token_path, raw.output_amount)
    }
}

impl RouteQuote {
    pub fn new(
        hops: Vec<Hop>,
        token_path: Vec<Address>,
        output_amount: U256,
    ) -> Result<Self, LeverageError> {
        if hops.is_empty() || hops.len() + 1 != token_path.len() {
            return Err(LeverageError::Encoding(format!(
                "route has {} hops for {} tokens",
                hops.len(),
                token_path.len()
            )));
        }
        Ok(Self {
            hops,
            token_path,
            output_amount,
        })
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn token_path(&self) -> &[Address] {
        &self.token_path
    }

    pub fn output_amount(&self) -> U256 {
        self.output_amount
    }

    pub fn token_in(&self) -> Address {
        self.token_path.first().copied().unwrap_or_default()
    }

    pub fn token_out(&self) -> Address {
        self.token_path.last().copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TOKEN_WBTC, TOKEN_WETH};
    use alloy::primitives::address;

    #[test]
    fn asset_rejects_zero_address() {
        let err = Asset::new(Address::ZERO, 18).validate().unwrap_err();
        assert!(matches!(err, LeverageError::InvalidAsset { .. }));
    }

    #[test]
    fn asset_rejects_oversized_decimals() {
        assert!(Asset::new(TOKEN_WBTC, 77).validate().is_ok());
        assert!(Asset::new(TOKEN_WBTC, 78).validate().is_err());
    }

    #[test]
    fn direct_route_has_one_hop_two_tokens() {
        let quote = RouteQuote::new(
            vec![Hop {
                pool: address!("cbcdf9626bc03e24f779434178a73a0b4bad62ed"),
                fee: 3000,
            }],
            vec![TOKEN_WBTC, TOKEN_WETH],
            U256::from(1_000u64),
        )
        .unwrap();
        assert_eq!(quote.hops().len(), 1);
        assert_eq!(quote.token_path().len(), 2);
        assert_eq!(quote.token_in(), TOKEN_WBTC);
        assert_eq!(quote.token_out(), TOKEN_WETH);
    }

    #[test]
    fn route_rejects_mismatched_lengths() {
        let hop = Hop {
            pool: Address::ZERO,
            fee: 500,
        };
        assert!(RouteQuote::new(vec![hop, hop], vec![TOKEN_WBTC, TOKEN_WETH], U256::ZERO).is_err());
        assert!(RouteQuote::new(vec![], vec![TOKEN_WBTC], U256::ZERO).is_err());
    }

    #[test]
    fn deserialize_enforces_hop_invariant() {
        let err = serde_json::from_str::<RouteQuote>(
            r#"{"hops":[],"token_path":[],"output_amount":"0x1"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("0 hops for 0 tokens"), "got: {err}");

        let quote = RouteQuote::new(
            vec![Hop {
                pool: Address::repeat_byte(0x42),
                fee: 500,
            }],
            vec![TOKEN_WBTC, TOKEN_WETH],
            U256::from(7u64),
        )
        .unwrap();
        let json = serde_json::to_string(&quote).unwrap();
        let back: RouteQuote = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token_in(), TOKEN_WBTC);
        assert_eq!(back.token_out(), TOKEN_WETH);
    }
}

//! Uniswap V3 swap payload encoding.
//!
//! Path layout: `token0 (20 bytes) || fee0 (3 bytes) || token1 (20 bytes) || ...`
//! The packed path is then ABI-encoded as `UniswapV3Data(path, deadline,
//! amountOutMinimum)`, or `UniswapV3PreviewData(path, deadline)` when no
//! minimum is carried.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;

use crate::constants::MAX_POOL_FEE;
use crate::errors::LeverageError;
use crate::types::{Hop, RouteQuote};

use super::contracts::{UniswapV3Data, UniswapV3PreviewData};

const ADDRESS_LEN: usize = 20;
const FEE_LEN: usize = 3;
const SEGMENT_LEN: usize = ADDRESS_LEN + FEE_LEN;

/// Pack a hop list into a V3 path. Requires `hops.len() == tokens.len() - 1`.
pub fn build_path(hops: &[Hop], tokens: &[Address]) -> Result<Bytes, LeverageError> {
    if hops.is_empty() || hops.len() + 1 != tokens.len() {
        return Err(LeverageError::Encoding(format!(
            "cannot pack {} hops between {} tokens",
            hops.len(),
            tokens.len()
        )));
    }

    let mut path = Vec::with_capacity(ADDRESS_LEN + hops.len() * SEGMENT_LEN);
    for (hop, token) in hops.iter().zip(tokens) {
        if hop.fee > MAX_POOL_FEE {
            return Err(LeverageError::Encoding(format!(
                "pool {:#x} fee {} does not fit uint24",
                hop.pool, hop.fee
            )));
        }
        path.extend_from_slice(token.as_slice());
        path.extend_from_slice(&hop.fee.to_be_bytes()[1..]);
    }
    path.extend_from_slice(tokens[tokens.len() - 1].as_slice());

    Ok(Bytes::from(path))
}

/// Pack the path of a resolved route.
pub fn build_route_path(route: &RouteQuote) -> Result<Bytes, LeverageError> {
    build_path(route.hops(), route.token_path())
}

/// Unpack a V3 path into its tokens and fees.
pub fn decode_path(path: &[u8]) -> Result<(Vec<Address>, Vec<u32>), LeverageError> {
    if path.len() < ADDRESS_LEN + SEGMENT_LEN || (path.len() - ADDRESS_LEN) % SEGMENT_LEN != 0 {
        return Err(LeverageError::Encoding(format!(
            "invalid V3 path length {}",
            path.len()
        )));
    }

    let hop_count = (path.len() - ADDRESS_LEN) / SEGMENT_LEN;
    let mut tokens = Vec::with_capacity(hop_count + 1);
    let mut fees = Vec::with_capacity(hop_count);
    for i in 0..hop_count {
        let start = i * SEGMENT_LEN;
        tokens.push(Address::from_slice(&path[start..start + ADDRESS_LEN]));
        let fee = &path[start + ADDRESS_LEN..start + SEGMENT_LEN];
        fees.push(u32::from_be_bytes([0, fee[0], fee[1], fee[2]]));
    }
    tokens.push(Address::from_slice(&path[path.len() - ADDRESS_LEN..]));

    Ok((tokens, fees))
}

/// Unix deadline `buffer_secs` after `now_secs`.
pub fn deadline_after(now_secs: u64, buffer_secs: u64) -> U256 {
    U256::from(now_secs.saturating_add(buffer_secs))
}

/// ABI-encode `(path, deadline, minOut)`.
pub fn encode_payload(path: Bytes, deadline: U256, min_out: U256) -> Bytes {
    let data = UniswapV3Data {
        path,
        deadline,
        amountOutMinimum: min_out,
    };
    Bytes::from(data.abi_encode())
}

/// ABI-encode `(path, deadline)`.
pub fn encode_preview_payload(path: Bytes, deadline: U256) -> Bytes {
    let data = UniswapV3PreviewData { path, deadline };
    Bytes::from(data.abi_encode())
}

/// Inverse of [`encode_payload`].
pub fn decode_payload(payload: &[u8]) -> Result<UniswapV3Data, LeverageError> {
    UniswapV3Data::abi_decode(payload)
        .map_err(|e| LeverageError::Encoding(format!("invalid swap payload: {e}")))
}

/// Inverse of [`encode_preview_payload`].
pub fn decode_preview_payload(payload: &[u8]) -> Result<UniswapV3PreviewData, LeverageError> {
    UniswapV3PreviewData::abi_decode(payload)
        .map_err(|e| LeverageError::Encoding(format!("invalid preview payload: {e}")))
}

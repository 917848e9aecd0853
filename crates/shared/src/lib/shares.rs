use std::collections::{BTreeMap, HashSet};

use alloy_primitives::utils::format_ether;
use alloy_primitives::{address, Address, I256, U256};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Receiver of the shares minted on protocol bootstrap.
pub const INITIAL_TOKEN_HOLDER: Address = address!("000000000000000000000000000000000000dEaD");

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SharesError {
    #[error("Account {account} ends with negative shares {shares}")]
    NegativeShares { account: Address, shares: I256 },
    #[error("Shares value {0} does not fit a signed 256-bit integer")]
    SharesOverflow(U256),
    #[error("Balance of {account} overflows: {shares} * {total_pooled_ace}")]
    BalanceOverflow {
        account: Address,
        shares: U256,
        total_pooled_ace: U256,
    },
}

/// Decoded `TransferShares(address indexed from, address indexed to, uint256 sharesValue)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharesTransfer {
    pub from: Address,
    pub to: Address,
    pub shares_value: U256,
}

/// Net shares per account after replaying transfers in order.
pub fn fold_transfers<I>(transfers: I) -> Result<BTreeMap<Address, I256>, SharesError>
where
    I: IntoIterator<Item = SharesTransfer>,
{
    let mut totals: BTreeMap<Address, I256> = BTreeMap::new();
    for transfer in transfers {
        let value = I256::try_from(transfer.shares_value).map_err(|_| SharesError::SharesOverflow(transfer.shares_value))?;
        let from = totals.entry(transfer.from).or_insert(I256::ZERO);
        *from = from.wrapping_sub(value);
        let to = totals.entry(transfer.to).or_insert(I256::ZERO);
        *to = to.wrapping_add(value);
    }
    Ok(totals)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderBalance {
    pub shares: U256,
    pub balance: U256,
}

/// Point-in-time view of every bACE holder: their shares and the ACE those shares are worth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharesImage {
    pub total_pooled_ace: U256,
    pub total_shares: U256,
    pub holders: BTreeMap<Address, HolderBalance>,
}

impl SharesImage {
    /// `excluded` holds protocol contract addresses; the zero address and the initial holder are always dropped.
    pub fn build<I>(
        transfers: I,
        excluded: &[Address],
        total_pooled_ace: U256,
        total_shares: U256,
    ) -> Result<Self, SharesError>
    where
        I: IntoIterator<Item = SharesTransfer>,
    {
        let mut skip: HashSet<Address> = excluded.iter().copied().collect();
        skip.insert(Address::ZERO);
        skip.insert(INITIAL_TOKEN_HOLDER);

        let mut holders = BTreeMap::new();
        for (account, shares) in fold_transfers(transfers)? {
            if skip.contains(&account) {
                continue;
            }
            if shares.is_negative() {
                return Err(SharesError::NegativeShares { account, shares });
            }
            let shares = shares.into_raw();
            let balance = Self::balance_of(account, shares, total_pooled_ace, total_shares)?;
            holders.insert(account, HolderBalance { shares, balance });
        }

        tracing::debug!(holders = holders.len(), "Built shares image");
        Ok(Self {
            total_pooled_ace,
            total_shares,
            holders,
        })
    }

    fn balance_of(
        account: Address,
        shares: U256,
        total_pooled_ace: U256,
        total_shares: U256,
    ) -> Result<U256, SharesError> {
        if total_shares.is_zero() {
            return Ok(U256::ZERO);
        }
        let product = shares.checked_mul(total_pooled_ace).ok_or(SharesError::BalanceOverflow {
            account,
            shares,
            total_pooled_ace,
        })?;
        Ok(product / total_shares)
    }

    pub fn holders_count(&self) -> usize {
        self.holders.len()
    }
}

impl Serialize for SharesImage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Rendered {
            shares: String,
            balance: String,
        }

        let mut map = serializer.serialize_map(Some(self.holders.len()))?;
        for (account, holder) in &self.holders {
            let rendered = Rendered {
                shares: holder.shares.to_string(),
                balance: format_ether(holder.balance),
            };
            map.serialize_entry(&account.to_checksum(None), &rendered)?;
        }
        map.end()
    }
}

use alloy_primitives::{keccak256, Address, Signature, B256, U256};
use alloy_sol_types::SolValue;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DepositSecurityError {
    #[error("Guardian {0} signed more than once")]
    DuplicateGuardian(Address),
}

/// Message guardians sign to allow a deposit of buffered ACE into a staking module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestMessage {
    pub block_number: u64,
    pub block_hash: B256,
    pub deposit_root: B256,
    pub staking_module_id: u64,
    pub nonce: u64,
}

impl AttestMessage {
    /// `keccak256(prefix ++ uint256(block_number) ++ block_hash ++ deposit_root ++ uint256(module_id) ++ uint256(nonce))`
    pub fn hash(&self, prefix: B256) -> B256 {
        let packed = (
            prefix,
            U256::from(self.block_number),
            self.block_hash,
            self.deposit_root,
            U256::from(self.staking_module_id),
            U256::from(self.nonce),
        )
            .abi_encode_packed();
        keccak256(packed)
    }
}

/// EIP-2098 signature: `vs` carries `s` with the recovery parity in the top bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactSignature {
    pub r: B256,
    pub vs: B256,
}

impl From<&Signature> for CompactSignature {
    fn from(signature: &Signature) -> Self {
        let mut vs = signature.s();
        if signature.v() {
            vs |= U256::from(1) << 255;
        }
        Self {
            r: B256::from(signature.r()),
            vs: B256::from(vs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSignature {
    pub guardian: Address,
    pub signature: CompactSignature,
}

/// The deposit security module walks signatures expecting strictly ascending guardian addresses.
pub fn sort_by_guardian(mut signatures: Vec<GuardianSignature>) -> Result<Vec<GuardianSignature>, DepositSecurityError> {
    signatures.sort_by_key(|sig| sig.guardian);
    if let Some(pair) = signatures.windows(2).find(|pair| pair[0].guardian == pair[1].guardian) {
        return Err(DepositSecurityError::DuplicateGuardian(pair[0].guardian));
    }
    Ok(signatures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use hex_literal::hex;

    fn message() -> AttestMessage {
        AttestMessage {
            block_number: 1_234_567,
            block_hash: B256::from(hex!("1111111111111111111111111111111111111111111111111111111111111111")),
            deposit_root: B256::from(hex!("2222222222222222222222222222222222222222222222222222222222222222")),
            staking_module_id: 1,
            nonce: 42,
        }
    }

    #[test]
    fn hash_matches_known_vector() {
        let prefix = B256::from(hex!("d85557c963041ae93cfa5927261eeb189c486b6d293ccee7da72ca9387cc241d"));
        assert_eq!(
            message().hash(prefix),
            B256::from(hex!("368712d6bb4184eac905330a3bc3a25d47cb365229ab21fc1328b8804823c0a1"))
        );
    }

    #[test]
    fn hash_depends_on_every_field() {
        let prefix = B256::ZERO;
        let base = message().hash(prefix);
        let mut other = message();
        other.nonce += 1;
        assert_ne!(base, other.hash(prefix));
        assert_ne!(base, message().hash(B256::with_last_byte(1)));
    }

    #[test]
    fn compact_signature_packs_parity_into_top_bit() {
        let r = U256::from(7);
        let s = U256::from(9);
        let even = CompactSignature::from(&Signature::new(r, s, false));
        let odd = CompactSignature::from(&Signature::new(r, s, true));

        assert_eq!(even.r, B256::from(r));
        assert_eq!(even.vs, B256::from(s));
        assert_eq!(odd.vs.0[0], 0x80);
        assert_eq!(odd.vs.0[31], 9);
    }

    #[test]
    fn sorts_signatures_by_guardian_address() {
        let sig = CompactSignature {
            r: B256::ZERO,
            vs: B256::ZERO,
        };
        let high = address!("f000000000000000000000000000000000000000");
        let low = address!("0000000000000000000000000000000000000001");
        let sorted = sort_by_guardian(vec![
            GuardianSignature { guardian: high, signature: sig },
            GuardianSignature { guardian: low, signature: sig },
        ])
        .unwrap();
        assert_eq!(sorted.iter().map(|s| s.guardian).collect::<Vec<_>>(), vec![low, high]);
    }

    #[test]
    fn duplicate_guardian_is_rejected() {
        let sig = CompactSignature {
            r: B256::ZERO,
            vs: B256::ZERO,
        };
        let guardian = address!("0000000000000000000000000000000000000001");
        let result = sort_by_guardian(vec![
            GuardianSignature { guardian, signature: sig },
            GuardianSignature { guardian, signature: sig },
        ]);
        assert_eq!(result, Err(DepositSecurityError::DuplicateGuardian(guardian)));
    }
}

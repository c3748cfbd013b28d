use core::fmt;

use alloy_primitives::hex;
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{merkle_root, Hash256, PackedEncoding, TreeHash, TreeHashType};

pub use alloy_primitives::{aliases::B32, Address, B256, U256};

pub type Slot = u64;
pub type Epoch = u64;
pub type Gwei = u64;
pub type ValidatorIndex = u64;
pub type DepositIndex = u64;
pub type WithdrawalIndex = u64;
pub type BlobIndex = u64;
pub type UnixSeconds = u64;

pub type H256 = B256;
pub type ExecutionBlockHash = B256;
pub type ExecutionAddress = Address;
pub type Version = B32;
pub type DomainType = B32;
pub type Domain = B256;
pub type VersionedHash = B256;

// Signatures and public keys stay compressed bytes in containers and are
// only decompressed when verified. Invalid points must round-trip through
// SSZ without failing; `helpers::signing` rejects them at verification time.
macro_rules! fixed_bytes_container {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0 == [0; $len]
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
                if bytes.len() != $len {
                    return Err(DecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: $len,
                    });
                }

                let mut inner = [0; $len];
                inner.copy_from_slice(bytes);
                Ok(Self(inner))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0; $len])
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "0x{}", hex::encode(self.0))
            }
        }

        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn ssz_bytes_len(&self) -> usize {
                $len
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                Self::from_slice(bytes)
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Vector
            }

            fn tree_hash_packed_encoding(&self) -> PackedEncoding {
                PackedEncoding::from_vec(self.0.to_vec())
            }

            fn tree_hash_packing_factor() -> usize {
                1
            }

            fn tree_hash_root(&self) -> Hash256 {
                merkle_root(&self.0, 0)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                let string = <String as serde::Deserialize>::deserialize(deserializer)?;
                let bytes = hex::decode(&string).map_err(serde::de::Error::custom)?;
                Self::from_slice(&bytes).map_err(|_| {
                    serde::de::Error::custom(format!(
                        "expected {} bytes, got {}",
                        $len,
                        bytes.len(),
                    ))
                })
            }
        }
    };
}

fixed_bytes_container!(PublicKeyBytes, 48);
fixed_bytes_container!(SignatureBytes, 96);
fixed_bytes_container!(KzgCommitment, 48);
fixed_bytes_container!(KzgProof, 48);

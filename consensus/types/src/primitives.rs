use serde::{Deserialize, Serialize};
use std::fmt;

pub type Hash256 = alloy_primitives::B256;
pub type ExecutionAddress = alloy_primitives::Address;

macro_rules! impl_fixed_bytes {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "hex_bytes")] pub [u8; $len]);

        impl $name {
            pub const fn zero() -> Self {
                Self([0; $len])
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex::encode(self.0))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }
    };
}

mod hex_bytes {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        use serde::Deserialize;
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let vec = hex::decode(s).map_err(serde::de::Error::custom)?;
        vec.try_into()
            .map_err(|_| serde::de::Error::custom("incorrect byte length"))
    }
}

/// 96-byte BLS signature, stapled to a signed container by the proposal pipeline.
impl_fixed_bytes!(SignatureBytes, 96);
/// 48-byte BLS public key identifying a validator in a registration or duty.
impl_fixed_bytes!(PublicKeyBytes, 48);
/// Free-form 32-byte field a proposer may stamp into a block.
impl_fixed_bytes!(Graffiti, 32);

impl SignatureBytes {
    pub fn empty() -> Self {
        Self::zero()
    }
}

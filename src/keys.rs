//! Key and MIC carriers together with the traits through which the codec reaches an AES-128 /
//! AES-CMAC implementation.
//!
//! Operations taking a key accept either a bare [`AES128`] or one of the typed keys through
//! [`Borrow<AES128>`].
use core::borrow::Borrow;

macro_rules! lorawan_key {
    (
        $(#[$outer:meta])*
        pub struct $type:ident(AES128);
    ) => {
        $(#[$outer])*
        #[doc = concat!(
            "# Usage\n\n",
            "## Creating from a hex-encoded MSB string:\n",
            "```\n",
            "use lorawan_codec::keys::", stringify!($type), ";\n",
            "use core::str::FromStr;\n",
            "let key = ", stringify!($type), "::from_str(\"00112233445566778899aabbccddeeff\").unwrap();\n",
            "```\n"
        )]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
        pub struct $type(pub(crate) AES128);

        impl $type {
            pub const fn byte_len() -> usize {
                16
            }

            pub fn inner(&self) -> &AES128 {
                &self.0
            }
        }

        impl From<[u8; 16]> for $type {
            fn from(key: [u8; 16]) -> Self {
                $type(AES128(key))
            }
        }

        impl AsRef<[u8]> for $type {
            fn as_ref(&self) -> &[u8] {
                &self.0 .0
            }
        }

        impl Borrow<AES128> for $type {
            fn borrow(&self) -> &AES128 {
                &self.0
            }
        }
    };
}

lorawan_key!(
    /// The [`AppKey`] is the AES-128 root key of a LoRaWAN 1.0 end-device. It encrypts the
    /// join-accept and signs join frames.
    pub struct AppKey(AES128);
);

lorawan_key!(
    /// The [`NwkKey`] is the LoRaWAN 1.1 network root key.
    pub struct NwkKey(AES128);
);

lorawan_key!(
    /// The [`NwkSKey`] is the LoRaWAN 1.0 network session key; it signs every data frame.
    pub struct NwkSKey(AES128);
);

lorawan_key!(
    /// The [`FNwkSIntKey`] computes half of the LoRaWAN 1.1 uplink MIC.
    pub struct FNwkSIntKey(AES128);
);

lorawan_key!(
    /// The [`SNwkSIntKey`] computes the other half of the LoRaWAN 1.1 uplink MIC and the whole
    /// downlink MIC.
    pub struct SNwkSIntKey(AES128);
);

/// [`AES128`] represents 128-bit AES key.
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct AES128(pub [u8; 16]);

impl From<[u8; 16]> for AES128 {
    fn from(v: [u8; 16]) -> Self {
        AES128(v)
    }
}

impl AES128 {
    /// Whether every byte is zero, as left by sanitization.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

/// [`MIC`] represents LoRaWAN message integrity code (MIC).
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct MIC(pub [u8; 4]);

impl From<[u8; 4]> for MIC {
    fn from(v: [u8; 4]) -> Self {
        MIC(v)
    }
}

impl AsRef<[u8]> for MIC {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Trait for implementations of AES128 encryption.
pub trait Encrypter {
    fn encrypt_block(&self, block: &mut [u8]);
}

/// Trait for implementations of AES128 decryption.
pub trait Decrypter {
    fn decrypt_block(&self, block: &mut [u8]);
}

/// Trait for implementations of CMAC (RFC4493).
pub trait Mac {
    fn input(&mut self, data: &[u8]);
    fn reset(&mut self);
    fn result(self) -> [u8; 16];
}

/// Represents an abstraction over the crypto functions.
///
/// This trait provides a way to pick a different implementation of the crypto primitives.
pub trait CryptoFactory {
    type E: Encrypter;
    type D: Decrypter;
    type M: Mac;

    /// Method that creates an Encrypter.
    fn new_enc(&self, key: &AES128) -> Self::E;

    /// Method that creates a Decrypter.
    fn new_dec(&self, key: &AES128) -> Self::D;

    /// Method that creates a MAC calculator.
    fn new_mac(&self, key: &AES128) -> Self::M;
}

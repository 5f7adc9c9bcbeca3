//! Textual (hex) form of identifiers and keys.
//!
//! Identifiers are stored in wire order (least significant byte first) and written most
//! significant byte first, so the text is the reverse of the wire bytes. Keys are written in the
//! order they are stored.
use crate::keys::*;
use crate::parser::*;

pub use hex::FromHexError;

#[cfg(feature = "with-to-string")]
fn write_hex<const N: usize, const L: usize>(
    f: &mut core::fmt::Formatter<'_>,
    bytes: [u8; N],
) -> core::fmt::Result {
    let mut buf = [0u8; L];
    hex::encode_to_slice(bytes, &mut buf).map_err(|_| core::fmt::Error)?;
    f.write_str(core::str::from_utf8(&buf).map_err(|_| core::fmt::Error)?)
}

macro_rules! fixed_len_struct_impl_string_msb {
    (
        $type:ident,$size:expr;
    ) => {
        impl core::str::FromStr for $type {
            type Err = FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut res = [0; $size];
                hex::decode_to_slice(s.as_bytes(), &mut res)?;
                Ok(Self::from(res))
            }
        }

        #[cfg(feature = "with-to-string")]
        impl core::fmt::Display for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut res = [0; $size];
                res.copy_from_slice(self.as_ref());
                write_hex::<$size, { $size * 2 }>(f, res)
            }
        }
    };
}

macro_rules! fixed_len_struct_impl_string_lsb {
    (
        $type:ident,$size:expr;
    ) => {
        impl core::str::FromStr for $type {
            type Err = FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut res = [0; $size];
                hex::decode_to_slice(s.as_bytes(), &mut res)?;
                Ok(Self::from_msb(res))
            }
        }

        #[cfg(feature = "with-to-string")]
        impl core::fmt::Display for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write_hex::<$size, { $size * 2 }>(f, self.to_msb())
            }
        }
    };
}

fixed_len_struct_impl_string_lsb! {
    EUI64, 8;
}

fixed_len_struct_impl_string_lsb! {
    DevNonce, 2;
}

fixed_len_struct_impl_string_lsb! {
    JoinNonce, 3;
}

fixed_len_struct_impl_string_lsb! {
    NetId, 3;
}

fixed_len_struct_impl_string_lsb! {
    DevAddr, 4;
}

fixed_len_struct_impl_string_msb! {
    AppKey, 16;
}

fixed_len_struct_impl_string_msb! {
    NwkKey, 16;
}

fixed_len_struct_impl_string_msb! {
    NwkSKey, 16;
}

fixed_len_struct_impl_string_msb! {
    FNwkSIntKey, 16;
}

fixed_len_struct_impl_string_msb! {
    SNwkSIntKey, 16;
}

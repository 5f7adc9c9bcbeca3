macro_rules! mac_cmd_zero_len {
    (
        $(
            $(#[$outer:meta])*
            struct $type:ident[cmd=$name:ident, cid=$cid:expr, uplink=$uplink:expr]
            )*
    ) => {
        $(
            $(#[$outer])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            #[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
            pub struct $type;

            impl $type {
                /// Creation.
                pub fn parse(_: &[u8; 0]) -> $type {
                    $type
                }

                /// Nothing to write.
                pub fn write_to(&self, _: &mut [u8; 0]) -> Result<(), Error> {
                    Ok(())
                }

                /// Get the CID.
                pub const fn cid() -> u8 {
                    $cid
                }

                /// Sent by end device or sent by network server.
                pub const fn uplink() -> bool {
                    $uplink
                }

                /// Length of empty payload.
                pub const fn len() -> usize {
                    0
                }
            }

            impl SerializableMacCommand for $type {
                fn cid(&self) -> u8 {
                    $cid
                }

                fn payload_len(&self) -> usize {
                    0
                }

                fn write_payload(&self, _: &mut [u8]) -> Result<(), Error> {
                    Ok(())
                }
            }
        )*
    }
}

macro_rules! mac_cmds {
    (
        $(
            $(#[$outer:meta])*
            struct $type:ident[cmd=$name:ident, cid=$cid:expr, uplink=$uplink:expr, size=$size:expr] {
                $(
                    $(#[$field_meta:meta])*
                    $field:ident: $field_type:ty
                ),* $(,)?
            }
            )*
    ) => {
        $(
            $(#[$outer])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            #[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
            pub struct $type {
                $(
                    $(#[$field_meta])*
                    pub $field: $field_type,
                )*
            }

            impl $type {
                /// Get the CID.
                pub const fn cid() -> u8 {
                    $cid
                }

                /// Sent by end device or sent by network server.
                pub const fn uplink() -> bool {
                    $uplink
                }

                /// Length of payload without the CID.
                pub const fn len() -> usize {
                    $size
                }
            }

            impl SerializableMacCommand for $type {
                fn cid(&self) -> u8 {
                    $cid
                }

                fn payload_len(&self) -> usize {
                    $size
                }

                fn write_payload(&self, out: &mut [u8]) -> Result<(), Error> {
                    let available = out.len();
                    let out: &mut [u8; $size] = out
                        .try_into()
                        .map_err(|_| Error::BufferTooShort { required: $size, available })?;
                    self.write_to(out)
                }
            }
        )*
    }
}

/// Single byte answers made of acknowledgement bits.
macro_rules! mac_cmd_acks {
    (
        $(
            $(#[$outer:meta])*
            struct $type:ident[cmd=$name:ident, cid=$cid:expr, uplink=$uplink:expr] {
                $(
                    $(#[$field_meta:meta])*
                    $field:ident = bit $bit:literal
                ),* $(,)?
            }
            )*
    ) => {
        mac_cmds! {
            $(
                $(#[$outer])*
                struct $type[cmd=$name, cid=$cid, uplink=$uplink, size=1] {
                    $(
                        $(#[$field_meta])*
                        $field: bool
                    ),*
                }
            )*
        }

        $(
            impl $type {
                pub fn parse(data: &[u8; 1]) -> $type {
                    $type {
                        $(
                            $field: data[0] & (1 << $bit) != 0,
                        )*
                    }
                }

                pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
                    out[0] = 0 $( | (self.$field as u8) << $bit )*;
                    Ok(())
                }

                /// Whether every requested change was accepted.
                pub fn ack(&self) -> bool {
                    true $( && self.$field )*
                }
            }
        )*
    }
}

macro_rules! mac_cmds_enum {
    (
        $(#[$enum_meta:meta])*
        $outer_vis:vis enum $outer_type:ident[direction=$direction:expr] {
        $(
            $name:ident($type:ident)
        )*
    }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
        #[allow(clippy::len_without_is_empty, missing_docs)]
        $outer_vis enum $outer_type {
            $(
                $name($type),
            )*
        }

        impl $outer_type {
            /// Get the length of the payload, without the CID.
            pub fn len(&self) -> usize {
                match *self {
                    $(
                        Self::$name(_) => $type::len(),
                    )*
                }
            }

            /// Sent by end device or sent by network server.
            pub fn uplink(&self) -> bool {
                match *self {
                    $(
                        Self::$name(_) => $type::uplink(),
                    )*
                }
            }

            /// Name of the command.
            pub fn name(&self) -> &'static str {
                match *self {
                    $(
                        Self::$name(_) => stringify!($name),
                    )*
                }
            }
        }

        impl SerializableMacCommand for $outer_type {
            fn cid(&self) -> u8 {
                match *self {
                    $(
                        Self::$name(_) => $type::cid(),
                    )*
                }
            }

            fn payload_len(&self) -> usize {
                self.len()
            }

            fn write_payload(&self, out: &mut [u8]) -> Result<(), Error> {
                match *self {
                    $(
                        Self::$name(ref v) => v.write_payload(out),
                    )*
                }
            }
        }

        impl MacCommandSet for $outer_type {
            const DIRECTION: Direction = $direction;

            const TABLE: &'static [MacCommandSpec] = &[
                $(
                    MacCommandSpec {
                        cid: $type::cid(),
                        len: $type::len(),
                        name: stringify!($name),
                    },
                )*
            ];

            fn parse_payload(cid: u8, payload: &[u8]) -> Option<Self> {
                $(
                    if cid == $type::cid() {
                        return payload.try_into().ok().map(|p| Self::$name($type::parse(p)));
                    }
                )*
                None
            }
        }

        $(
            impl From<$type> for $outer_type {
                fn from(v: $type) -> Self {
                    Self::$name(v)
                }
            }
        )*
    }
}

// Export the macros for internal use
pub(crate) use {mac_cmd_acks, mac_cmd_zero_len, mac_cmds, mac_cmds_enum};

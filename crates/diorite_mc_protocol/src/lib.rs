pub mod play;
pub mod types;

#[macro_export]
macro_rules! identify_packets {
    { $enum_name:ident, $( $packet:ident = $val:tt ),* $(,)? } => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
        #[repr(u8)]
        pub enum $enum_name {
            $( $packet = $val, )*
        }

        /// Any packet of this direction, as handed to the transport layer.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Packet {
            $( $packet($packet), )*
        }

        impl Packet {
            pub fn get_packet_id(&self) -> $enum_name {
                match self {
                    $( Packet::$packet(_) => $enum_name::$packet, )*
                }
            }
        }

        $(impl From<$packet> for Packet {
            fn from(packet: $packet) -> Self {
                Packet::$packet(packet)
            }
        })*

        pub trait PacketHandler {
            paste::paste! {
                $(
                    fn [<handle_ $packet:snake>](&mut self, _: &$packet) {}
                )*
            }

            fn handle(&mut self, packet: &Packet) {
                match packet {
                    $(
                        Packet::$packet(inner) => paste::paste! {
                            self.[<handle_ $packet:snake>](inner)
                        },
                    )*
                }
            }
        }
    }
}

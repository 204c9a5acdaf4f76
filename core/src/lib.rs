pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::bus::{Backplane, Bus, BusError, FlatRam, BAD_U8, BUS_SIZE, N_SLOTS};
    pub use crate::core::card::{Card, CardInfo};
    pub use crate::cpu::i8080::{CpuError, I8080};
    pub use crate::cpu::state::{CpuState, Flag, Reg16, Reg8};
    pub use crate::device::acia6850::Acia6850;
    pub use crate::device::data_card::DataCard;
    pub use crate::device::endpoint::{Parity, SerialEndpoint};
}

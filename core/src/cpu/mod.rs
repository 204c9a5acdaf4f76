pub mod i8080;
pub mod state;

pub use i8080::{CpuError, I8080};
pub use state::{CpuState, Flag, Reg16, Reg8};

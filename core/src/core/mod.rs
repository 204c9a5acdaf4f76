pub mod bus;
pub mod card;

pub use bus::{Backplane, Bus, BusError, FlatRam};
pub use card::{Card, CardInfo};

pub mod acia6850;
pub mod data_card;
pub mod endpoint;

pub use acia6850::Acia6850;
pub use data_card::DataCard;
pub use endpoint::{Parity, SerialEndpoint};

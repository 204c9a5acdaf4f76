//! TOML hardware description.
//!
//! One `[emulator]` table with run options and one `[[card]]` table per
//! slot to populate:
//!
//! ```toml
//! [emulator]
//! pseudo_bdos_enabled = true
//! start_with_pc_at = 0x100
//!
//! [[card]]
//! type = "rom"
//! at = 0x0000
//! slot = 1
//! load = "monitor.bin"
//!
//! [[card]]
//! type = "serial"
//! at = 0x10
//! slot = 0
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use s100_core::core::bus::{Backplane, BusError, BAD_U8};
use s100_core::device::acia6850::Acia6850;
use s100_core::device::data_card::DataCard;

use crate::pty::UnixPty;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("configuration is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{kind} card in slot {slot} needs a range or a load file")]
    CardUnderspecified { kind: &'static str, slot: usize },
    #[error(transparent)]
    Bus(#[from] BusError),
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    emulator: EmulatorSection,
    #[serde(default, rename = "card")]
    cards: Vec<CardSection>,
}

#[derive(Debug, Default, Deserialize)]
struct EmulatorSection {
    #[serde(default)]
    pseudo_bdos_enabled: bool,
    #[serde(default)]
    start_with_pc_at: u16,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CardKind {
    Ram,
    Rom,
    Serial,
}

#[derive(Debug, Deserialize)]
struct CardSection {
    #[serde(rename = "type")]
    kind: CardKind,
    at: u16,
    slot: usize,
    range: Option<usize>,
    load: Option<PathBuf>,
    #[serde(default)]
    let_collide: bool,
}

/// A fully assembled backplane plus the emulator options that came with
/// it.
pub struct SystemConfig {
    bus: Backplane,
    pseudo_bdos_enabled: bool,
    start_with_pc_at: u16,
}

impl SystemConfig {
    /// Parse a configuration file and build the hardware it describes.
    /// Relative `load` paths resolve against the config file's
    /// directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_str_with_base(&text, base)
    }

    /// Parse a configuration from a string; `base` anchors relative
    /// `load` paths.
    pub fn from_str_with_base(text: &str, base: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let mut bus = Backplane::new();
        for card in &raw.cards {
            match card.kind {
                CardKind::Ram => {
                    bus.insert(build_data_card(card, base, false)?, card.slot, card.let_collide)?
                }
                CardKind::Rom => {
                    bus.insert(build_data_card(card, base, true)?, card.slot, card.let_collide)?
                }
                CardKind::Serial => {
                    let pty = UnixPty::open().map_err(BusError::Endpoint)?;
                    let uart = Acia6850::new(card.at, pty)?;
                    bus.insert(Box::new(uart), card.slot, card.let_collide)?;
                }
            }
        }

        Ok(Self {
            bus,
            pseudo_bdos_enabled: raw.emulator.pseudo_bdos_enabled,
            start_with_pc_at: raw.emulator.start_with_pc_at,
        })
    }

    pub fn pseudo_bdos_enabled(&self) -> bool {
        self.pseudo_bdos_enabled
    }

    pub fn start_with_pc_at(&self) -> u16 {
        self.start_with_pc_at
    }

    pub fn bus(&self) -> &Backplane {
        &self.bus
    }

    pub fn into_bus(self) -> Backplane {
        self.bus
    }
}

fn build_data_card(
    card: &CardSection,
    base: &Path,
    write_locked: bool,
) -> Result<Box<DataCard>, ConfigError> {
    let kind = if write_locked { "rom" } else { "ram" };

    let image = match &card.load {
        Some(load) => {
            let path = if load.is_absolute() {
                load.clone()
            } else {
                base.join(load)
            };
            Some(std::fs::read(&path).map_err(|source| ConfigError::Io { path, source })?)
        }
        None => None,
    };

    let built = match (image, card.range) {
        (Some(bytes), range) => DataCard::with_bytes(card.at, bytes, range.unwrap_or(0), write_locked)?,
        // A blank ROM reads like erased EPROM; blank RAM starts zeroed.
        (None, Some(range)) if write_locked => DataCard::rom(card.at, range, BAD_U8),
        (None, Some(range)) => DataCard::ram(card.at, range),
        (None, None) => {
            return Err(ConfigError::CardUnderspecified {
                kind,
                slot: card.slot,
            })
        }
    };
    Ok(Box::new(built))
}

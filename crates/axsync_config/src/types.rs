//! Configuration types deserialized from `axsync.toml`.

use serde::Deserialize;

/// The top-level configuration parsed from `axsync.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct SyncConfig {
    /// Reference slave register bank.
    #[serde(default)]
    pub slave: SlaveConfig,
    /// Master-side transaction settings.
    #[serde(default)]
    pub transactor: TransactorSettings,
    /// Default trace settings.
    #[serde(default)]
    pub trace: TraceSettings,
}

/// Shape of the reference slave's register bank.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SlaveConfig {
    /// Byte address of register 0. Must be 8-byte aligned.
    pub base_address: u32,
    /// Number of 64-bit registers.
    pub register_count: usize,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            base_address: 0,
            register_count: 1024,
        }
    }
}

/// Transaction settings for the master-side driver.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransactorSettings {
    /// Rising edges a single read or write may wait.
    pub timeout_cycles: u32,
    /// Rising edges reset is held for by the `reset` command.
    pub reset_cycles: u32,
    /// Protection code driven on `arprot`/`awprot` (3 bits).
    pub prot: u8,
}

impl Default for TransactorSettings {
    fn default() -> Self {
        Self {
            timeout_cycles: 10_000,
            reset_cycles: 4,
            prot: 0b010,
        }
    }
}

/// Default trace settings, overridable from the command line.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraceSettings {
    /// Hierarchy depth: 0 ports only, 1 adds slave registers, 2 adds the bank.
    pub depth: u32,
    /// Output format. Inferred from the destination extension when absent.
    pub format: Option<TraceFormatSetting>,
}

/// Trace output format.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormatSetting {
    /// Value Change Dump (IEEE 1364).
    Vcd,
    /// One JSON object per line.
    Jsonl,
}

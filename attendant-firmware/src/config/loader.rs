//! Configuration and routine persistence
//!
//! Loads the robot configuration from flash storage, falling back to the
//! embedded `robot.toml` when no override is stored. Also restores the
//! four taught routines from their slots.

use defmt::*;

use attendant_core::config::{parse_config, RobotConfig, MAX_CONFIG_SIZE};
use attendant_core::mode::ModeKind;
use attendant_core::sequence::{LoadStatus, SequenceStore, RECORD_SIZE};
use attendant_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
// Import the FlashStorage trait to bring methods into scope
use attendant_hal_rp2040::FlashStorageTrait;

/// Embedded default configuration (compiled into firmware)
/// Edit robot.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../robot.toml");

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Stored bytes are not a valid configuration of this version
    Deserialize,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

/// Persistence manager for configuration and routines
pub struct ConfigPersistence<'d> {
    storage: FlashStorage<'d>,
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(storage: FlashStorage<'d>) -> Self {
        Self { storage }
    }

    /// Consume this persistence manager and return the underlying storage
    ///
    /// The storage task takes it over once boot has finished reading.
    pub fn into_storage(self) -> FlashStorage<'d> {
        self.storage
    }

    /// Load the configuration
    ///
    /// Order: binary override in flash, embedded TOML, built-in defaults.
    pub async fn load(&mut self) -> RobotConfig {
        info!("Loading configuration from flash...");

        let config = match self.load_binary().await {
            Ok(config) => {
                info!("Loaded configuration override from flash");
                config
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                debug!("No stored configuration, using embedded robot.toml");
                embedded_config()
            }
            Err(e) => {
                warn!("Stored configuration unusable: {:?}", e);
                embedded_config()
            }
        };

        log_config_summary(&config);
        config
    }

    /// Load the binary postcard override
    async fn load_binary(&mut self) -> Result<RobotConfig, ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::RobotConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of binary config from flash", len);

        RobotConfig::from_bytes(&buffer[..len]).ok_or(ConfigError::Deserialize)
    }

    /// Restore every routine slot
    ///
    /// Missing or corrupt slots come back empty; boot continues either way.
    pub async fn load_sequences(&mut self) -> SequenceStore {
        let mut store = SequenceStore::new();
        let mut buffer = [0u8; RECORD_SIZE];

        for kind in ModeKind::ALL {
            let Some(key) = StorageKey::sequence(kind.index() as u8) else {
                continue;
            };

            let status = match self.storage.read(key, &mut buffer).await {
                Ok(len) => store.restore(kind, &buffer[..len]),
                Err(FlashError::NotFound) => LoadStatus::Empty,
                Err(e) => {
                    warn!("{} routine: flash read failed: {:?}", kind.name(), e);
                    LoadStatus::Empty
                }
            };

            match status {
                LoadStatus::Loaded(frames) => {
                    info!("{} routine: {} frames", kind.name(), frames)
                }
                LoadStatus::Empty => debug!("{} routine: empty", kind.name()),
                LoadStatus::Corrupt(e) => {
                    warn!("{} routine corrupt ({:?}), starting empty", kind.name(), e)
                }
            }
        }

        store
    }
}

/// Parse the embedded configuration
///
/// `robot.toml` is validated by the build script, so failure here means
/// the validator and the parser disagree.
fn embedded_config() -> RobotConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in defaults");
            RobotConfig::default()
        }
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &RobotConfig) {
    info!("Configuration loaded successfully");
    debug!("  obstacle threshold {} cm", config.obstacle_threshold_cm);
    debug!("  default frame {} ms", config.default_frame_ms);
    debug!("  {} schedule entries", config.schedule.len());
    debug!(
        "  alert {} beeps ({}/{} ms)",
        config.alert.beeps, config.alert.on_ms, config.alert.off_ms
    );
}

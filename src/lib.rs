// Currency Lens - camera currency recognition core
// Module declarations and public surface

pub mod acceptance;
pub mod audio;
pub mod classifier;
pub mod config;
pub mod currency;
pub mod interaction;
pub mod session;
pub mod wallet;

pub use acceptance::{AcceptanceConfig, AcceptancePolicy, DetectionDecision, RejectReason, Verdict};
pub use config::{default_config_path, AppConfig, ConfigError};
pub use currency::{Denomination, DetectionMode};
pub use interaction::{Effect, Input, InteractionMachine, SessionView};
pub use session::{spawn_session, Scanner, SessionHandle};

pub mod level;

pub use level::{AudioLevelConfig, AudioLevelMonitor, AudioNotice};

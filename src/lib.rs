// Library interface for pitwall
// This allows integration tests and benches to access internal modules

pub mod analysis;
pub mod config;
pub mod errors;
pub mod plotting;
pub mod report;
pub mod session;
pub mod ui;

// Re-export commonly used types
pub use analysis::{RaceTraceReference, TrackStatus};
pub use config::AppConfig;
pub use errors::PitwallError;
pub use plotting::{Axes, Figure, Rgb};
pub use session::{
    CarSample, DriverInfo, EventInfo, FileBasedCache, LapRecord, Session, SessionKind,
    SessionProvider, WeatherSample,
};

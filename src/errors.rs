// Error types for pitwall

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitwallError {
    // Session cache errors
    #[snafu(display("Could not find a cache directory for session data"))]
    NoCacheDir,
    #[snafu(display("Error accessing session cache"))]
    CacheIOError { source: io::Error },
    #[snafu(display("No cached session for {year} {event} {session}"))]
    SessionNotFound {
        year: u16,
        event: String,
        session: String,
    },
    #[snafu(display("Event '{query}' is ambiguous, candidates: {}", candidates.join(", ")))]
    AmbiguousEvent {
        query: String,
        candidates: Vec<String>,
    },

    // Session file errors
    #[snafu(display("Error loading session file"))]
    SessionLoaderError { source: io::Error },
    #[snafu(display("Invalid session file {path}: {reason}"))]
    InvalidSessionFile { path: String, reason: String },
    #[snafu(display("Session file {path} has no event record"))]
    MissingEventInfo { path: String },
    #[snafu(display("Error writing session file"))]
    WriterError { source: io::Error },
    #[snafu(display("Error serializing session record"))]
    SessionSerializeError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Analysis errors
    #[snafu(display("Driver {driver} not found"))]
    DriverNotFound { driver: String },
    #[snafu(display("Lap {lap_number} of driver {driver} not found"))]
    LapNotFound { driver: String, lap_number: u32 },
    #[snafu(display(
        "Not enough telemetry for {driver} lap {lap_number}: {samples} samples, need at least 2"
    ))]
    InsufficientTelemetry {
        driver: String,
        lap_number: u32,
        samples: usize,
    },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },

    // Rendering errors
    #[snafu(display("Figure rendering failed: {reason}"))]
    FigureRenderError { reason: String },
    #[snafu(display("Error writing figure file"))]
    FigureWriteError { source: io::Error },
    #[snafu(display("Could not start figure viewer: {reason}"))]
    ViewerError { reason: String },
}

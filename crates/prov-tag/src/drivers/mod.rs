pub mod line_scanner;
pub mod scripted;
pub mod unavailable;

pub use line_scanner::LineScannerDriver;
pub use scripted::ScriptedDriver;
pub use unavailable::UnavailableDriver;

//! ADB (Android Debug Bridge) backend for device control
//!
//! This module provides:
//! - `connection`: device discovery against the adb server
//! - `device`: app lifecycle and UI-dump capture for one device
//! - `screenshot`: screen capture for failure diagnostics
//! - `ui_dump`: parsing of `uiautomator dump` snapshots

mod connection;
mod device;
mod screenshot;
mod ui_dump;

pub use connection::{connect, list_devices, ConnectionType, DeviceInfo};
pub use device::AdbDriver;
pub use screenshot::Screenshot;
pub use ui_dump::{Bounds, UiNode, UiSnapshot};

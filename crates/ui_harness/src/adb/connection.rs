//! ADB server queries for device discovery

use std::time::Duration;
use tokio::process::Command;

use crate::error::{HarnessError, Result};

/// How a device is attached to the adb server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Usb,
    Remote,
}

/// One row of `adb devices -l`
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub device_id: String,
    pub status: String,
    pub connection_type: ConnectionType,
    pub model: Option<String>,
}

impl DeviceInfo {
    pub fn is_ready(&self) -> bool {
        self.status == "device"
    }

    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let device_id = parts.next()?.to_string();
        let status = parts.next()?.to_string();
        let connection_type = if device_id.contains(':') {
            ConnectionType::Remote
        } else {
            ConnectionType::Usb
        };
        let model = parts
            .find(|part| part.starts_with("model:"))
            .and_then(|part| part.split(':').nth(1))
            .map(|model| model.to_string());
        Some(Self {
            device_id,
            status,
            connection_type,
            model,
        })
    }
}

async fn adb_output(adb_path: &str, args: &[&str], timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        Command::new(adb_path).args(args).output(),
    )
    .await
    .map_err(|_| {
        HarnessError::Timeout(format!(
            "adb {} timed out after {}s",
            args.join(" "),
            timeout_secs
        ))
    })?
    .map_err(HarnessError::Io)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(format!("{}{}", stdout, stderr))
}

/// List devices known to the adb server
pub async fn list_devices(adb_path: &str) -> Result<Vec<DeviceInfo>> {
    let output = adb_output(adb_path, &["devices", "-l"], 5).await?;
    Ok(output
        .lines()
        .skip(1) // header line
        .filter(|line| !line.trim().is_empty())
        .filter_map(DeviceInfo::parse)
        .collect())
}

/// Connect the adb server to a remote device (`ip[:port]`, default 5555)
pub async fn connect(adb_path: &str, address: &str) -> Result<String> {
    let address = if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:5555", address)
    };

    let output = adb_output(adb_path, &["connect", &address], 10).await?;
    if output.to_lowercase().contains("connected") {
        Ok(address)
    } else {
        Err(HarnessError::DeviceNotFound(output.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usb_device_line() {
        let info =
            DeviceInfo::parse("emulator-5554    device product:sdk_gphone64 model:Pixel_6 device:emu64a")
                .unwrap();
        assert_eq!(info.device_id, "emulator-5554");
        assert!(info.is_ready());
        assert_eq!(info.connection_type, ConnectionType::Usb);
        assert_eq!(info.model.as_deref(), Some("Pixel_6"));
    }

    #[test]
    fn test_parse_remote_unauthorized_line() {
        let info = DeviceInfo::parse("192.168.1.20:5555  unauthorized").unwrap();
        assert_eq!(info.connection_type, ConnectionType::Remote);
        assert!(!info.is_ready());
        assert!(info.model.is_none());
    }

    #[test]
    fn test_parse_rejects_blank_line() {
        assert!(DeviceInfo::parse("   ").is_none());
    }
}

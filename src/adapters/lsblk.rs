use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{BlockDevice, DeviceKind, Topology};
use crate::error::Result;
use crate::ports::CommandExecutor;

/// Device listing tool, located via PATH.
pub const LSBLK_BIN: &str = "lsblk";

/// Enumerates physical disks and the partition/parent topology tree.
pub struct BlockDeviceInventory {
    runner: Arc<dyn CommandExecutor>,
    timeout: Duration,
}

impl BlockDeviceInventory {
    pub fn new(runner: Arc<dyn CommandExecutor>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    /// Physical disks only, in the tool's native output order.
    pub async fn list_physical_disks(&self) -> Result<Vec<BlockDevice>> {
        let out = self
            .runner
            .run(
                LSBLK_BIN,
                &["-b", "-d", "-n", "-o", "NAME,TYPE,SIZE"],
                self.timeout,
            )
            .await?;
        Ok(parse_disk_listing(&out))
    }

    /// Full partition/parent tree from the key="value" pairs layout.
    pub async fn list_topology(&self) -> Result<Topology> {
        let out = self
            .runner
            .run(
                LSBLK_BIN,
                &["-b", "-n", "-P", "-o", "NAME,KNAME,TYPE,PKNAME,PATH,SIZE"],
                self.timeout,
            )
            .await?;
        Ok(Topology::new(parse_topology_listing(&out)))
    }

    /// Disk path to size-in-GB map, disk-kind entries with positive size only.
    pub async fn size_by_path(&self) -> Result<HashMap<String, f64>> {
        Ok(self.list_topology().await?.size_by_path())
    }
}

/// Parse the columnar `NAME TYPE SIZE` listing, keeping disk entries only.
fn parse_disk_listing(out: &str) -> Vec<BlockDevice> {
    out.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 2 {
                return None;
            }
            if DeviceKind::parse(cols[1]) != DeviceKind::Disk {
                return None;
            }
            let name = cols[0].to_string();
            Some(BlockDevice {
                kname: name.clone(),
                path: format!("/dev/{}", name),
                name,
                kind: DeviceKind::Disk,
                pkname: String::new(),
                size_bytes: cols.get(2).and_then(|s| s.parse().ok()).unwrap_or(0),
            })
        })
        .collect()
}

/// Parse the `KEY="value"` pairs listing into block devices, tolerating
/// missing fields and stripping quoting defensively.
fn parse_topology_listing(out: &str) -> Vec<BlockDevice> {
    out.lines()
        .filter_map(|line| {
            let kv = parse_pairs_line(line);
            let name = kv.get("NAME")?.clone();
            if name.is_empty() {
                return None;
            }
            let kname = kv
                .get("KNAME")
                .filter(|k| !k.is_empty())
                .cloned()
                .unwrap_or_else(|| name.clone());
            Some(BlockDevice {
                name,
                kname,
                kind: DeviceKind::parse(kv.get("TYPE").map(String::as_str).unwrap_or("")),
                pkname: kv.get("PKNAME").cloned().unwrap_or_default(),
                path: kv.get("PATH").cloned().unwrap_or_default(),
                size_bytes: kv.get("SIZE").and_then(|s| s.parse().ok()).unwrap_or(0),
            })
        })
        .collect()
}

/// Split one `KEY="value" KEY="value"` line. Values may contain spaces
/// inside quotes; unquoted values are taken up to the next whitespace.
fn parse_pairs_line(line: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut rest = line.trim();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim().to_string();
        rest = &rest[eq + 1..];

        let value;
        if let Some(stripped) = rest.strip_prefix('"') {
            match stripped.find('"') {
                Some(end) => {
                    value = stripped[..end].to_string();
                    rest = &stripped[end + 1..];
                }
                None => {
                    // Unterminated quote; take the remainder.
                    value = stripped.to_string();
                    rest = "";
                }
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            value = rest[..end].trim_matches('"').to_string();
            rest = &rest[end..];
        }
        rest = rest.trim_start();

        if !key.is_empty() {
            map.insert(key, value);
        }
    }

    map
}

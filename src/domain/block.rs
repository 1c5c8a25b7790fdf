use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Upper bound on parent-link hops when resolving a partition to its root
/// disk. Real hierarchies rarely exceed 3-4 levels (partition, crypt, lvm);
/// the bound only exists to terminate on malformed or cyclic parent data.
pub const MAX_PARENT_HOPS: usize = 12;

/// Kind of block device as reported by the device listing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Disk,
    Part,
    Other,
}

impl DeviceKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => DeviceKind::Disk,
            "part" => DeviceKind::Part,
            _ => DeviceKind::Other,
        }
    }
}

/// Block device entity. Identity is the kernel name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    pub kname: String,
    pub kind: DeviceKind,
    /// Kernel name of the parent device, empty for top-level devices.
    pub pkname: String,
    pub path: String,
    pub size_bytes: u64,
}

impl BlockDevice {
    /// Device path, synthesized from the name when the tool omitted PATH.
    pub fn device_path(&self) -> String {
        if self.path.is_empty() {
            format!("/dev/{}", self.name)
        } else {
            self.path.clone()
        }
    }
}

/// Partition/parent topology indexed for root-disk resolution.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    devices: Vec<BlockDevice>,
    by_kname: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
}

impl Topology {
    pub fn new(devices: Vec<BlockDevice>) -> Self {
        let mut by_kname = HashMap::new();
        let mut by_path = HashMap::new();
        for (i, dev) in devices.iter().enumerate() {
            by_kname.insert(dev.kname.clone(), i);
            if !dev.path.is_empty() {
                by_path.insert(dev.path.clone(), i);
            }
        }
        Self {
            devices,
            by_kname,
            by_path,
        }
    }

    /// Look up a device by its path, matching both the explicit PATH column
    /// and the conventional `/dev/<kname>` spelling.
    pub fn lookup_path(&self, device_path: &str) -> Option<&BlockDevice> {
        if let Some(&i) = self.by_path.get(device_path) {
            return Some(&self.devices[i]);
        }
        let kname = device_path.strip_prefix("/dev/")?;
        self.by_kname.get(kname).map(|&i| &self.devices[i])
    }

    /// Walk parent links from `dev` until a disk-kind node is reached,
    /// returning its device path. Bounded by [`MAX_PARENT_HOPS`] so cyclic
    /// or malformed parent data yields `None` instead of looping. Idempotent
    /// when `dev` itself is a disk.
    pub fn resolve_root_disk(&self, dev: &BlockDevice) -> Option<String> {
        let mut current = dev;
        for _ in 0..=MAX_PARENT_HOPS {
            if current.kind == DeviceKind::Disk {
                return Some(current.device_path());
            }
            if current.pkname.is_empty() {
                return None;
            }
            let &i = self.by_kname.get(&current.pkname)?;
            current = &self.devices[i];
        }
        None
    }

    /// Map of disk path to size in GB, restricted to disk-kind entries with
    /// a positive size.
    pub fn size_by_path(&self) -> HashMap<String, f64> {
        self.devices
            .iter()
            .filter(|d| d.kind == DeviceKind::Disk && d.size_bytes > 0)
            .map(|d| (d.device_path(), d.size_bytes as f64 / super::usage::BYTES_PER_GB))
            .collect()
    }
}

/// Guess a partition's root disk from its name alone, for devices absent
/// from the topology listing. `nvme*` and `mmcblk*` partitions carry a `pN`
/// suffix; everything else a plain trailing digit run.
pub fn root_disk_by_naming(device_path: &str) -> Option<String> {
    let name = device_path.strip_prefix("/dev/")?;
    if name.is_empty() {
        return None;
    }

    let base = if name.starts_with("nvme") || name.starts_with("mmcblk") {
        strip_partition_suffix(name).unwrap_or(name)
    } else {
        name.trim_end_matches(|c: char| c.is_ascii_digit())
    };

    if base.is_empty() {
        return None;
    }
    Some(format!("/dev/{}", base))
}

/// Strip a trailing `p<digits>` partition suffix, e.g. `nvme0n1p1` -> `nvme0n1`.
fn strip_partition_suffix(name: &str) -> Option<&str> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = &name[..name.len() - digits];
    rest.strip_suffix('p').map(|_| &name[..name.len() - digits - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(name: &str, kind: DeviceKind, pkname: &str) -> BlockDevice {
        BlockDevice {
            name: name.to_string(),
            kname: name.to_string(),
            kind,
            pkname: pkname.to_string(),
            path: format!("/dev/{}", name),
            size_bytes: 1 << 30,
        }
    }

    #[test]
    fn test_partition_resolves_to_root_disk() {
        let topo = Topology::new(vec![
            dev("nvme0n1", DeviceKind::Disk, ""),
            dev("nvme0n1p1", DeviceKind::Part, "nvme0n1"),
        ]);
        let part = topo.lookup_path("/dev/nvme0n1p1").unwrap();
        assert_eq!(topo.resolve_root_disk(part).as_deref(), Some("/dev/nvme0n1"));
    }

    #[test]
    fn test_resolve_is_idempotent_on_disk() {
        let topo = Topology::new(vec![dev("sda", DeviceKind::Disk, "")]);
        let disk = topo.lookup_path("/dev/sda").unwrap();
        assert_eq!(topo.resolve_root_disk(disk).as_deref(), Some("/dev/sda"));
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let topo = Topology::new(vec![
            dev("dm-0", DeviceKind::Part, "dm-1"),
            dev("dm-1", DeviceKind::Part, "dm-0"),
        ]);
        let node = topo.lookup_path("/dev/dm-0").unwrap();
        assert_eq!(topo.resolve_root_disk(node), None);
    }

    #[test]
    fn test_deep_chain_within_hop_bound() {
        let mut devices = vec![dev("sda", DeviceKind::Disk, "")];
        let mut parent = "sda".to_string();
        for i in 0..4 {
            let name = format!("layer{}", i);
            devices.push(dev(&name, DeviceKind::Part, &parent));
            parent = name;
        }
        let topo = Topology::new(devices);
        let leaf = topo.lookup_path("/dev/layer3").unwrap();
        assert_eq!(topo.resolve_root_disk(leaf).as_deref(), Some("/dev/sda"));
    }

    #[test]
    fn test_missing_parent_yields_none() {
        let topo = Topology::new(vec![dev("sda1", DeviceKind::Part, "sda")]);
        let part = topo.lookup_path("/dev/sda1").unwrap();
        assert_eq!(topo.resolve_root_disk(part), None);
    }

    #[test]
    fn test_synthesized_path_when_column_missing() {
        let mut disk = dev("sdb", DeviceKind::Disk, "");
        disk.path.clear();
        assert_eq!(disk.device_path(), "/dev/sdb");
    }

    #[test]
    fn test_size_by_path_skips_partitions_and_empty_disks() {
        let mut empty = dev("sdc", DeviceKind::Disk, "");
        empty.size_bytes = 0;
        let topo = Topology::new(vec![
            dev("sda", DeviceKind::Disk, ""),
            dev("sda1", DeviceKind::Part, "sda"),
            empty,
        ]);
        let sizes = topo.size_by_path();
        assert_eq!(sizes.len(), 1);
        assert!((sizes["/dev/sda"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_naming_fallback() {
        assert_eq!(
            root_disk_by_naming("/dev/nvme0n1p1").as_deref(),
            Some("/dev/nvme0n1")
        );
        assert_eq!(
            root_disk_by_naming("/dev/mmcblk0p2").as_deref(),
            Some("/dev/mmcblk0")
        );
        assert_eq!(root_disk_by_naming("/dev/sda3").as_deref(), Some("/dev/sda"));
        assert_eq!(root_disk_by_naming("/dev/sda").as_deref(), Some("/dev/sda"));
        assert_eq!(root_disk_by_naming("not-a-dev-path"), None);
    }

    #[test]
    fn test_naming_fallback_keeps_unpartitioned_nvme() {
        // No pN suffix to strip; the namespace digit stays.
        assert_eq!(
            root_disk_by_naming("/dev/nvme0n1").as_deref(),
            Some("/dev/nvme0n1")
        );
    }
}

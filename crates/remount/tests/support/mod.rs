//! In-memory device for integration tests.

#![allow(dead_code)]

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::rc::Rc;

use remount::Platform;
use remount::services::{
    BlockDevices, CheckpointConnector, CheckpointService, DsuConnector, DsuService, FstabSource,
    LogicalPartitionMapper, MountTableReader, OverlayManager, PropertySource, Rebooter, VerityControl,
};
use remount_common::{RemountError, RemountResult};
use remount_fstab::{Fstab, MountTable, MountTableEntry, PartitionDescriptor};

/// DSU guest state.
#[derive(Debug, Default, Clone)]
pub struct Dsu {
    pub running: bool,
    pub enabled: bool,
    pub install_status: i32,
    pub enabled_slots: Vec<String>,
}

/// Everything the fake device knows and everything it was asked to do.
#[derive(Debug, Default)]
pub struct DeviceState {
    pub props: HashMap<String, String>,
    pub fstab: Fstab,
    pub mounts: Vec<MountTableEntry>,
    pub checkpointing: bool,
    pub mounts_unreadable_after_overlay: bool,

    pub verity_protected: HashSet<String>,
    pub verity_rejects: bool,
    pub verity_disabled_slots: Vec<String>,

    pub overlay_setup_fails: HashSet<String>,
    pub overlay_mount_all_fails: bool,
    pub overlay_setups: Vec<(String, bool)>,
    pub mount_all_calls: usize,
    pub scratch_cleaned: bool,

    pub remount_errors: HashMap<String, VecDeque<i32>>,
    pub remounts: Vec<(String, String)>,
    pub read_only_cleared: Vec<String>,

    pub dsu: Option<Dsu>,
    pub reboots: Vec<String>,
}

/// A device whose every seam is backed by [`DeviceState`].
#[derive(Clone, Default)]
pub struct FakeDevice(Rc<RefCell<DeviceState>>);

impl FakeDevice {
    /// An unlocked userdebug device with no partitions.
    pub fn new() -> Self {
        let device = Self::default();
        device.set_prop("ro.debuggable", "1");
        device.set_prop("ro.boot.vbmeta.device_state", "unlocked");
        device.set_prop("ro.boot.slot_suffix", "_a");
        device
    }

    /// Legacy device with `/system` and `/vendor` mounted at their own paths.
    pub fn split_system() -> Self {
        let device = Self::new();
        device.add_partition(
            PartitionDescriptor::new("/dev/block/by-name/system", "/system", "ext4").with_read_only(),
            "/dev/block/mmcblk0p20",
        );
        device.add_partition(
            PartitionDescriptor::new("/dev/block/by-name/vendor", "/vendor", "ext4").with_read_only(),
            "/dev/block/mmcblk0p21",
        );
        device
    }

    /// Typical system-as-root device with a logical system and vendor.
    pub fn system_as_root() -> Self {
        let device = Self::new();
        device.add_partition(
            PartitionDescriptor::new("system", "/", "ext4").with_read_only(),
            "/dev/root",
        );
        device.add_partition(
            PartitionDescriptor::new("/dev/block/by-name/vendor", "/vendor", "ext4").with_read_only(),
            "/dev/block/dm-1",
        );
        device.add_partition(
            PartitionDescriptor::new("/dev/block/by-name/userdata", "/data", "f2fs"),
            "/dev/block/dm-5",
        );
        device
    }

    pub fn set_prop(&self, key: &str, value: &str) {
        self.state_mut().props.insert(key.to_string(), value.to_string());
    }

    /// Add `entry` to the fstab and mount it from `device`.
    pub fn add_partition(&self, entry: PartitionDescriptor, device: &str) {
        let mut state = self.state_mut();
        state
            .mounts
            .push(MountTableEntry::new(device, entry.mount_point.as_str(), entry.fs_type.as_str()));
        state.fstab.push(entry);
    }

    /// Add `entry` to the fstab without mounting it.
    pub fn add_unmounted(&self, entry: PartitionDescriptor) {
        self.state_mut().fstab.push(entry);
    }

    pub fn state(&self) -> Ref<'_, DeviceState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, DeviceState> {
        self.0.borrow_mut()
    }

    pub fn platform(&self) -> Platform {
        Platform {
            properties: Box::new(self.clone()),
            fstab: Box::new(self.clone()),
            mounts: Box::new(self.clone()),
            checkpoint: Box::new(self.clone()),
            verity: Box::new(self.clone()),
            overlay: Box::new(self.clone()),
            mapper: Box::new(self.clone()),
            block: Box::new(self.clone()),
            dsu: Box::new(self.clone()),
            rebooter: Box::new(self.clone()),
        }
    }

    fn overlay_mounted(&self, mount_point: &str) -> bool {
        self.state()
            .mounts
            .iter()
            .rev()
            .find(|m| m.mount_point == mount_point)
            .is_some_and(|m| m.fs_type == "overlay")
    }
}

impl PropertySource for FakeDevice {
    fn get(&self, key: &str) -> Option<String> {
        self.state().props.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> RemountResult<()> {
        self.set_prop(key, value);
        Ok(())
    }
}

impl FstabSource for FakeDevice {
    fn read_file(&self, path: &Path) -> RemountResult<Fstab> {
        Fstab::from_file(path)
    }

    fn read_default(&self) -> RemountResult<Fstab> {
        Ok(self.state().fstab.clone())
    }
}

impl MountTableReader for FakeDevice {
    fn snapshot(&self) -> RemountResult<MountTable> {
        let state = self.state();
        if state.mounts_unreadable_after_overlay && state.mount_all_calls > 0 {
            return Err(RemountError::NoMounts {
                reason: "permission denied".to_string(),
            });
        }
        Ok(state.mounts.iter().cloned().collect())
    }
}

impl CheckpointService for FakeDevice {
    fn is_checkpointing(&self) -> RemountResult<bool> {
        Ok(self.state().checkpointing)
    }
}

impl CheckpointConnector for FakeDevice {
    fn connect(&self) -> Option<Box<dyn CheckpointService + '_>> {
        Some(Box::new(self.clone()))
    }
}

impl VerityControl for FakeDevice {
    fn is_verity_enabled(&self, entry: &PartitionDescriptor) -> bool {
        self.state().verity_protected.contains(&entry.mount_point)
    }

    fn disable_verity(&self, slot_suffix: &str) -> RemountResult<()> {
        let mut state = self.state_mut();
        if state.verity_rejects {
            return Err(RemountError::service("avb", "vbmeta is read-only"));
        }
        state.verity_disabled_slots.push(slot_suffix.to_string());
        state.verity_protected.clear();
        Ok(())
    }
}

impl OverlayManager for FakeDevice {
    fn candidates(&self, fstab: &Fstab) -> Fstab {
        fstab
            .iter()
            .filter(|e| e.read_only && e.mount_point.matches('/').count() == 1)
            .cloned()
            .collect()
    }

    fn wants_overlay(&self, entry: &PartitionDescriptor) -> bool {
        entry.fs_type == "erofs"
    }

    fn setup(&self, mount_point: &str, force: bool) -> RemountResult<bool> {
        let mounted = self.overlay_mounted(mount_point);
        let mut state = self.state_mut();
        state.overlay_setups.push((mount_point.to_string(), force));
        if state.overlay_setup_fails.contains(mount_point) {
            return Err(RemountError::Io(std::io::Error::other("no space left on device")));
        }
        Ok(force || (mount_point == "/" && !mounted))
    }

    fn already_mounted(&self, mount_point: &str) -> bool {
        self.overlay_mounted(mount_point)
    }

    fn mount_all(&self, partitions: &[PartitionDescriptor]) -> RemountResult<()> {
        let wanted: Vec<String> = partitions
            .iter()
            .filter(|e| self.wants_overlay(e) && e.mount_point != "/" && !self.overlay_mounted(&e.mount_point))
            .map(|e| e.mount_point.clone())
            .collect();

        let mut state = self.state_mut();
        state.mount_all_calls += 1;
        if state.overlay_mount_all_fails {
            return Err(RemountError::Overlay {
                mount_point: wanted.join(","),
                reason: "overlayfs is not supported by this kernel".to_string(),
            });
        }
        for mount_point in wanted {
            state
                .mounts
                .push(MountTableEntry::new("overlay", mount_point.as_str(), "overlay"));
        }
        Ok(())
    }

    fn cleanup_scratch(&self) -> RemountResult<()> {
        self.state_mut().scratch_cleaned = true;
        Ok(())
    }
}

impl LogicalPartitionMapper for FakeDevice {
    fn resolve(&self, entry: &mut PartitionDescriptor) -> RemountResult<()> {
        entry.block_device = format!("/dev/block/mapper/{}", entry.name());
        Ok(())
    }
}

impl BlockDevices for FakeDevice {
    fn set_read_only(&self, device: &str, read_only: bool) -> std::io::Result<()> {
        assert!(!read_only, "remount only ever clears the read-only bit");
        self.state_mut().read_only_cleared.push(device.to_string());
        Ok(())
    }

    fn remount(&self, device: &str, mount_point: &str, _fs_type: &str) -> std::io::Result<()> {
        let mut state = self.state_mut();
        state.remounts.push((device.to_string(), mount_point.to_string()));
        match state
            .remount_errors
            .get_mut(mount_point)
            .and_then(VecDeque::pop_front)
        {
            Some(errno) => Err(std::io::Error::from_raw_os_error(errno)),
            None => Ok(()),
        }
    }
}

impl DsuService for FakeDevice {
    fn is_running(&self) -> RemountResult<bool> {
        Ok(self.state().dsu.as_ref().is_some_and(|d| d.running))
    }

    fn is_enabled(&self) -> RemountResult<bool> {
        Ok(self.state().dsu.as_ref().is_some_and(|d| d.enabled))
    }

    fn active_slot(&self) -> RemountResult<String> {
        Ok("dsu".to_string())
    }

    fn enable_one_shot(&self, slot: &str) -> RemountResult<i32> {
        let mut state = self.state_mut();
        let dsu = state
            .dsu
            .as_mut()
            .ok_or_else(|| RemountError::service("gsid", "not installed"))?;
        dsu.enabled_slots.push(slot.to_string());
        Ok(dsu.install_status)
    }
}

impl DsuConnector for FakeDevice {
    fn connect(&self) -> Option<Box<dyn DsuService + '_>> {
        self.state().dsu.is_some().then(|| Box::new(self.clone()) as Box<dyn DsuService>)
    }
}

impl Rebooter for FakeDevice {
    fn reboot(&self, reason: &str) -> RemountResult<()> {
        self.state_mut().reboots.push(reason.to_string());
        Ok(())
    }
}

/// Mounted-at pairs the device was asked to remount.
pub fn remounted(device: &FakeDevice) -> Vec<String> {
    device.state().remounts.iter().map(|(_, mp)| mp.clone()).collect()
}

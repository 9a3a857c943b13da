//! Text parsers for the Android fstab format and `/proc/mounts`.
//!
//! `/proc/mounts` records are read with `proc_mounts`, which also decodes
//! the kernel's octal escapes. fstab lines have the shape
//! `<src> <mnt_point> <type> <mnt_flags> <fs_mgr_flags>`; blank lines and
//! lines starting with `#` are ignored. Malformed lines are skipped with a
//! warning rather than failing the whole table.

use std::io::BufRead;

use proc_mounts::{MountInfo, MountIter};

use crate::entry::{FsMgrFlags, MountTableEntry, PartitionDescriptor};
use crate::table::{Fstab, MountTable};

/// Parse fstab text.
#[must_use]
pub fn parse_fstab(content: &str) -> Fstab {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let entry = parse_fstab_line(line);
            if entry.is_none() {
                tracing::warn!(line = index + 1, "Skipping malformed fstab line");
            }
            entry
        })
        .collect()
}

fn parse_fstab_line(line: &str) -> Option<PartitionDescriptor> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [source, mount_point, fs_type, mnt_flags, rest @ ..] = fields.as_slice() else {
        return None;
    };

    let mut entry = PartitionDescriptor::new(*source, *mount_point, *fs_type);
    for flag in mnt_flags.split(',').filter(|f| !f.is_empty()) {
        match flag {
            "ro" => entry.read_only = true,
            "defaults" | "rw" => {}
            other => entry.mount_options.push(other.to_string()),
        }
    }
    if let Some(fs_mgr_flags) = rest.first() {
        entry.fs_mgr_flags = parse_fs_mgr_flags(fs_mgr_flags);
    }
    Some(entry)
}

fn parse_fs_mgr_flags(field: &str) -> FsMgrFlags {
    let mut flags = FsMgrFlags::default();
    for flag in field.split(',') {
        let key = flag.split_once('=').map_or(flag, |(key, _)| key);
        match key {
            "voldmanaged" => flags.vold_managed = true,
            "recoveryonly" => flags.recovery_only = true,
            "slotselect_other" => flags.slot_select_other = true,
            "slotselect" => flags.slot_select = true,
            "logical" => flags.logical = true,
            "avb" => flags.avb = true,
            _ => {}
        }
    }
    flags
}

/// Parse `/proc/mounts` text.
#[must_use]
pub fn parse_mounts(content: &str) -> MountTable {
    collect_mounts(MountIter::new_from_reader(content.as_bytes()))
}

/// Build a mount table from `/proc/mounts` records, skipping malformed ones.
#[must_use]
pub fn collect_mounts<R: BufRead>(records: MountIter<R>) -> MountTable {
    records
        .filter_map(|record| match record {
            Ok(info) => Some(mount_entry(info)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed mount line");
                None
            }
        })
        .collect()
}

fn mount_entry(info: MountInfo) -> MountTableEntry {
    MountTableEntry::new(info.source.to_string_lossy(), info.dest.to_string_lossy(), info.fstype)
        .with_options(info.options)
}

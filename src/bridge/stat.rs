use serde::Serialize;
use std::ops::Index;

use crate::storage::{Entry, EntryKind};

/// Directory mode, 0777 / 目录权限
pub const DIR_MODE: i64 = 0o40777;
/// File mode, 0664 / 文件权限
pub const FILE_MODE: i64 = 0o100664;

fn clamp_size(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

/// Fixed-shape stat record / 固定结构的 stat 记录
///
/// Readable by position (`stat[7]`) or by name (`stat.get("size")`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub dev: i64,
    pub ino: i64,
    pub mode: i64,
    pub nlink: i64,
    pub uid: i64,
    pub gid: i64,
    pub rdev: i64,
    pub size: i64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    pub blksize: i64,
    pub blocks: i64,
}

impl Stat {
    pub const FIELDS: [&'static str; 13] = [
        "dev", "ino", "mode", "nlink", "uid", "gid", "rdev", "size", "atime", "mtime", "ctime",
        "blksize", "blocks",
    ];

    fn empty(atime: i64) -> Self {
        Self {
            dev: 0,
            ino: 0,
            mode: 0,
            nlink: 0,
            uid: 0,
            gid: 0,
            rdev: 0,
            size: 0,
            atime,
            mtime: 0,
            ctime: 0,
            blksize: -1,
            blocks: -1,
        }
    }

    /// Map adapter metadata; backends expose no creation time, so the
    /// timestamp is used for both mtime and ctime
    pub fn from_entry(entry: &Entry, request_time: i64) -> Self {
        let mut stat = Self::empty(request_time);
        stat.mode = match entry.kind {
            EntryKind::Dir => DIR_MODE,
            EntryKind::File => FILE_MODE,
        };
        if let Some(size) = entry.size {
            stat.size = clamp_size(size);
        }
        if let Some(timestamp) = entry.timestamp {
            stat.mtime = timestamp;
            stat.ctime = timestamp;
        }
        stat
    }

    /// Stat of a local buffer of `size` bytes / 本地缓冲区的 stat
    pub fn for_buffer(size: u64, request_time: i64) -> Self {
        Self {
            mode: FILE_MODE,
            size: clamp_size(size),
            mtime: request_time,
            ctime: request_time,
            ..Self::empty(request_time)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode == DIR_MODE
    }

    pub fn is_file(&self) -> bool {
        self.mode == FILE_MODE
    }

    /// Positional values in `FIELDS` order / 按位置排列的值
    pub fn values(&self) -> [i64; 13] {
        [
            self.dev, self.ino, self.mode, self.nlink, self.uid, self.gid, self.rdev, self.size,
            self.atime, self.mtime, self.ctime, self.blksize, self.blocks,
        ]
    }

    /// Named access / 按名称读取
    pub fn get(&self, key: &str) -> Option<i64> {
        Self::FIELDS
            .iter()
            .position(|field| *field == key)
            .map(|i| self.values()[i])
    }
}

impl Index<usize> for Stat {
    type Output = i64;

    fn index(&self, index: usize) -> &i64 {
        match index {
            0 => &self.dev,
            1 => &self.ino,
            2 => &self.mode,
            3 => &self.nlink,
            4 => &self.uid,
            5 => &self.gid,
            6 => &self.rdev,
            7 => &self.size,
            8 => &self.atime,
            9 => &self.mtime,
            10 => &self.ctime,
            11 => &self.blksize,
            12 => &self.blocks,
            _ => panic!("stat index out of range: {}", index),
        }
    }
}

impl Index<&str> for Stat {
    type Output = i64;

    fn index(&self, key: &str) -> &i64 {
        match Self::FIELDS.iter().position(|field| *field == key) {
            Some(i) => &self[i],
            None => panic!("unknown stat field: {}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_mapping() {
        let entry = Entry::file("a.txt", 42, Some(1_700_000_000));
        let stat = Stat::from_entry(&entry, 1_800_000_000);

        assert_eq!(stat.mode, 33204);
        assert_eq!(stat.size, 42);
        assert_eq!(stat.mtime, 1_700_000_000);
        assert_eq!(stat.ctime, 1_700_000_000);
        assert_eq!(stat.atime, 1_800_000_000);
        assert_eq!(stat.blksize, -1);
        assert!(stat.is_file());
    }

    #[test]
    fn test_dir_mapping_defaults() {
        let stat = Stat::from_entry(&Entry::dir("d", None), 5);
        assert_eq!(stat.mode, 16895);
        assert_eq!(stat.size, 0);
        assert_eq!(stat.mtime, 0);
        assert!(stat.is_dir());
    }

    #[test]
    fn test_index_and_named_access_agree() {
        let stat = Stat::from_entry(&Entry::file("a", 7, Some(9)), 1);
        for (i, field) in Stat::FIELDS.iter().enumerate() {
            assert_eq!(stat[i], stat[*field]);
            assert_eq!(Some(stat[i]), stat.get(field));
        }
        assert_eq!(stat[7], 7);
        assert_eq!(stat.get("nope"), None);
    }

    #[test]
    fn test_oversized_sizes_saturate() {
        let stat = Stat::from_entry(&Entry::file("huge", u64::MAX, None), 0);
        assert_eq!(stat.size, i64::MAX);
        assert_eq!(Stat::for_buffer(u64::MAX, 0).size, i64::MAX);
    }
}

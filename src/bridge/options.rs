use std::str::FromStr;

use crate::error::BridgeError;

/// Parsed `fopen`-style mode string / 打开模式
///
/// Only the initial buffer state depends on the mode: `w` truncates, `a`
/// starts at the end, `x` refuses existing objects. Close always uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub truncate: bool,
    pub append: bool,
    pub exclusive: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode {
        read: true,
        write: false,
        truncate: false,
        append: false,
        exclusive: false,
    };

    pub const READ_WRITE: OpenMode = OpenMode { write: true, ..Self::READ };

    pub const WRITE: OpenMode = OpenMode {
        read: false,
        write: true,
        truncate: true,
        append: false,
        exclusive: false,
    };

    pub const APPEND: OpenMode = OpenMode { truncate: false, append: true, ..Self::WRITE };
}

impl FromStr for OpenMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BridgeError::InvalidMode(s.to_string());

        let mut chars = s.chars();
        let mut mode = match chars.next().ok_or_else(invalid)? {
            'r' => Self::READ,
            'w' => Self::WRITE,
            'a' => Self::APPEND,
            'x' => OpenMode { truncate: false, exclusive: true, ..Self::WRITE },
            'c' => OpenMode { truncate: false, ..Self::WRITE },
            _ => return Err(invalid()),
        };

        for c in chars {
            match c {
                '+' => {
                    mode.read = true;
                    mode.write = true;
                }
                // Binary / text flags have no meaning here / 忽略 b、t 标记
                'b' | 't' => {}
                _ => return Err(invalid()),
            }
        }

        Ok(mode)
    }
}

/// Options passed to `open` / 打开选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Record the resolved target as the opened path / 记录实际打开路径
    pub use_path: bool,
}

/// Reference point for `seek` / 定位基准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Current,
    End,
}

pub const LOCK_SH: i32 = 1;
pub const LOCK_EX: i32 = 2;
pub const LOCK_NB: i32 = 4;
pub const LOCK_UN: i32 = 8;

/// Advisory lock operations applied to the local buffer / 锁操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOperation {
    Shared,
    Exclusive,
    Unlock,
    NonBlocking,
}

impl LockOperation {
    /// Only the four plain codes are recognized; combinations are not
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            LOCK_SH => Some(Self::Shared),
            LOCK_EX => Some(Self::Exclusive),
            LOCK_UN => Some(Self::Unlock),
            LOCK_NB => Some(Self::NonBlocking),
            _ => None,
        }
    }
}

/// Metadata change requests (`touch`, `chown`, `chgrp`, `chmod`) / 元数据操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOption {
    Touch,
    Owner,
    Group,
    Access,
}

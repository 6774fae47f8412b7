//! Local working copy of an open object / 打开对象的本地缓冲区

use bytes::Bytes;
use fs2::FileExt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tokio::io::{AsyncRead, AsyncWriteExt};

use super::options::LockOperation;

/// Temp-file backed buffer; removed by the OS once dropped / 临时文件缓冲区
pub struct LocalBuffer {
    file: File,
}

impl LocalBuffer {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            file: tempfile::tempfile()?,
        })
    }

    /// Stream `reader` into the buffer and rewind / 流式载入数据并回到开头
    ///
    /// The object goes straight to the temp file, never whole into memory.
    pub async fn fill_from<R>(&mut self, reader: &mut R) -> io::Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.file.set_len(0)?;
        self.file.rewind()?;
        let mut file = tokio::fs::File::from_std(self.file.try_clone()?);
        let copied = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        self.file.rewind()?;
        Ok(copied)
    }

    /// Read up to `count` bytes from the cursor / 读取最多 count 字节
    pub fn read(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(count.min(64 * 1024));
        (&mut self.file).take(count as u64).read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write_all(data)?;
        Ok(data.len())
    }

    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    pub fn tell(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Resize without moving the cursor / 截断或扩展，不移动游标
    pub fn truncate(&mut self, size: u64) -> io::Result<()> {
        self.file.set_len(size)
    }

    pub fn eof(&mut self) -> io::Result<bool> {
        Ok(self.tell()? >= self.len()?)
    }

    /// Whole buffer contents; leaves the cursor at the end / 读取全部内容
    pub fn contents(&mut self) -> io::Result<Bytes> {
        let mut data = Vec::new();
        self.file.rewind()?;
        self.file.read_to_end(&mut data)?;
        Ok(Bytes::from(data))
    }

    /// Apply an advisory lock to the buffer file / 对缓冲文件加锁
    pub fn lock(&self, operation: LockOperation) -> io::Result<()> {
        match operation {
            LockOperation::Shared => FileExt::lock_shared(&self.file),
            LockOperation::Exclusive => FileExt::lock_exclusive(&self.file),
            LockOperation::Unlock => FileExt::unlock(&self.file),
            LockOperation::NonBlocking => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "non-blocking flag without a lock kind",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_seek() {
        let mut buffer = LocalBuffer::new().unwrap();
        buffer.write(b"abcdef").unwrap();
        assert!(buffer.eof().unwrap());

        buffer.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(buffer.read(3).unwrap(), b"cde");
        assert_eq!(buffer.tell().unwrap(), 5);
        assert_eq!(buffer.read(10).unwrap(), b"f");
        assert!(buffer.eof().unwrap());
    }

    #[tokio::test]
    async fn test_fill_and_contents() {
        let mut buffer = LocalBuffer::new().unwrap();
        buffer.write(b"old data that is long").unwrap();
        let mut reader: &[u8] = b"new";
        assert_eq!(buffer.fill_from(&mut reader).await.unwrap(), 3);

        assert_eq!(buffer.tell().unwrap(), 0);
        assert_eq!(buffer.len().unwrap(), 3);
        assert_eq!(buffer.contents().unwrap(), Bytes::from_static(b"new"));
        assert_eq!(buffer.tell().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_fill_large_object() {
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let mut buffer = LocalBuffer::new().unwrap();
        let mut reader = data.as_slice();
        buffer.fill_from(&mut reader).await.unwrap();

        assert_eq!(buffer.read(4).unwrap(), &data[..4]);
        assert_eq!(buffer.contents().unwrap(), Bytes::from(data));
    }

    #[test]
    fn test_truncate_keeps_cursor() {
        let mut buffer = LocalBuffer::new().unwrap();
        buffer.write(b"abcdef").unwrap();
        buffer.truncate(2).unwrap();

        assert_eq!(buffer.len().unwrap(), 2);
        assert_eq!(buffer.tell().unwrap(), 6);
    }

    #[test]
    fn test_lock_unlock() {
        let buffer = LocalBuffer::new().unwrap();
        buffer.lock(LockOperation::Exclusive).unwrap();
        buffer.lock(LockOperation::Unlock).unwrap();
        buffer.lock(LockOperation::Shared).unwrap();
        assert!(buffer.lock(LockOperation::NonBlocking).is_err());
    }
}

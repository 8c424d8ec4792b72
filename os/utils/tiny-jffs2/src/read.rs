//! # File Reads
//!
//! A file is the result of replaying its inode records. Each record carries
//! a version, the file size after it applies, and a payload for one range.
//! The reader replays only uncompressed history: it starts at the newest
//! truncation to zero (or the oldest record) and copies every later record
//! in physical order.

use crate::Ino;
use crate::cursor::NodeCursor;
use crate::node::InodeRecord;
use log::debug;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("no inode record for ino {0}")]
    InodeNotFound(Ino),
    #[error("ino {ino} has compressed data at version {version}")]
    CompressionUnsupported { ino: Ino, version: u32 },
}

/// Version summary of one inode, gathered in a first pass.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
struct History {
    oldest: Option<u32>,
    /// Greatest version that truncated the file to zero.
    truncated: Option<u32>,
    /// Greatest version with a compressed payload.
    compressed: Option<u32>,
    /// `(version, isize)` of the greatest version.
    latest: Option<(u32, u32)>,
}

impl History {
    fn gather(image: &[u8], ino: Ino) -> Self {
        let mut history = Self::default();
        for rec in records(image, ino) {
            let v = rec.version;
            if history.oldest.is_none_or(|min| v < min) {
                history.oldest = Some(v);
            }
            if rec.isize == 0 && history.truncated.is_none_or(|t| v > t) {
                history.truncated = Some(v);
            }
            if rec.is_compressed() && history.compressed.is_none_or(|c| v > c) {
                history.compressed = Some(v);
            }
            if history.latest.is_none_or(|(latest, _)| v > latest) {
                history.latest = Some((v, rec.isize));
            }
        }
        history
    }
}

/// Replays records in physical order, starting at `baseline`.
struct Replay<'b> {
    baseline: u32,
    applied: Option<u32>,
    out: &'b mut [u8],
}

impl Replay<'_> {
    fn pass(&mut self, image: &[u8], ino: Ino) {
        for rec in records(image, ino) {
            let wanted = match self.applied {
                None => rec.version == self.baseline,
                Some(last) => rec.version > last,
            };
            if wanted {
                self.applied = Some(rec.version);
                self.copy(&rec);
            }
        }
    }

    fn copy(&mut self, rec: &InodeRecord<'_>) {
        let Ok(offset) = usize::try_from(rec.offset) else {
            return;
        };
        let Some(room) = self.out.len().checked_sub(offset).filter(|&room| room > 0) else {
            return;
        };
        let len = usize::try_from(rec.dsize)
            .unwrap_or(usize::MAX)
            .min(room)
            .min(rec.data.len());
        self.out[offset..offset + len].copy_from_slice(&rec.data[..len]);
    }
}

/// Records of `ino`. Version 0 is never written by JFFS2 and is skipped.
fn records(image: &[u8], ino: Ino) -> impl Iterator<Item = InodeRecord<'_>> {
    NodeCursor::new(image)
        .filter_map(|node| node.as_inode())
        .filter(move |rec| rec.ino == ino && rec.version > 0)
}

/// Reads the contents of `ino` into `buf`.
///
/// Returns the number of bytes produced: the smaller of `buf.len()` and the
/// final file size. All of `buf` is zero-filled before replay, so holes and
/// everything past the returned length read as zeros.
///
/// # Errors
/// * [`ReadError::InodeNotFound`] if the image holds no record for `ino`.
/// * [`ReadError::CompressionUnsupported`] if a compressed record is newer
///   than the replay baseline.
pub fn read(image: &[u8], ino: Ino, buf: &mut [u8]) -> Result<usize, ReadError> {
    let history = History::gather(image, ino);
    let (Some(oldest), Some((latest, size))) = (history.oldest, history.latest) else {
        return Err(ReadError::InodeNotFound(ino));
    };

    let baseline = history.truncated.unwrap_or(oldest);
    if let Some(version) = history.compressed
        && version > baseline
    {
        return Err(ReadError::CompressionUnsupported { ino, version });
    }

    buf.fill(0);
    let len = buf.len().min(usize::try_from(size).unwrap_or(usize::MAX));

    let mut replay = Replay {
        baseline,
        applied: None,
        out: &mut buf[..len],
    };
    replay.pass(image, ino);
    if replay.applied != Some(latest) {
        // Records newer than `applied` that sit physically before it.
        debug!(
            "ino {ino}: replay stopped at {:?}, want {latest}; second pass",
            replay.applied
        );
        replay.pass(image, ino);
    }

    Ok(len)
}

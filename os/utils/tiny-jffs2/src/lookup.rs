use crate::Ino;
use crate::cursor::NodeCursor;

/// Resolves `name` in directory `parent` with a single pass over the image.
///
/// The directory entry with the strictly greatest version wins; on equal
/// versions the first one in physical order is kept. Entries with version 0
/// never match. A winning entry that targets inode 0 records an unlink and
/// resolves to `None`.
#[must_use]
pub fn lookup(image: &[u8], parent: Ino, name: &[u8]) -> Option<Ino> {
    let mut best: Option<(u32, Ino)> = None;

    for dirent in NodeCursor::new(image).filter_map(|node| node.as_dirent()) {
        if dirent.version == 0 || dirent.parent != parent || !dirent.name_is(name) {
            continue;
        }
        if best.is_none_or(|(version, _)| dirent.version > version) {
            best = Some((dirent.version, dirent.ino));
        }
    }

    best.map(|(_, ino)| ino).filter(|&ino| ino != 0)
}

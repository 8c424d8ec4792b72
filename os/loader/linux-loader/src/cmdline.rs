//! Kernel command line from the configuration image.
//!
//! The command line lives in a plain file of the `etc` JFFS2 image. It is
//! read into a buffer the size of the tag slot, cut at the first NUL, and
//! stripped of trailing whitespace (editors like to end files with `\n`).

use crate::config::CommandLineSource;
use boot_info::layout::COMMAND_LINE_SIZE;
use boot_info::tags::{BootTagList, TagError};
use tiny_jffs2::{Image, ReadError};

/// Outcome of one extraction attempt. Only [`Extraction::Applied`] touches
/// the tag list; every other outcome leaves the slot inert.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Extraction {
    /// The slot now holds this many command line bytes.
    Applied(usize),
    /// No directory entry for the file.
    NoFile,
    /// The file exists but holds nothing usable.
    Empty,
    Unreadable(ReadError),
    Rejected(TagError),
}

impl Extraction {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Looks up the command line file in `image` and stores its contents in the
/// command line slot of `tags`.
pub fn extract(image: Image<'_>, source: &CommandLineSource, tags: &mut BootTagList) -> Extraction {
    let Some(ino) = image.lookup(source.parent, source.name.as_bytes()) else {
        return Extraction::NoFile;
    };

    let mut buf = [0u8; COMMAND_LINE_SIZE];
    let len = match image.read(ino, &mut buf) {
        Ok(len) => len,
        Err(e) => return Extraction::Unreadable(e),
    };

    let content = &buf[..len];
    let content = content
        .iter()
        .position(|&b| b == 0)
        .map_or(content, |nul| &content[..nul])
        .trim_ascii_end();
    if content.is_empty() {
        return Extraction::Empty;
    }

    match tags.set_command_line(content) {
        Ok(()) => Extraction::Applied(content.len()),
        Err(e) => Extraction::Rejected(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boot_info::layout::COMMAND_LINE_MAX;
    use boot_info::tags::{BootTagId, Tags};
    use tiny_jffs2::pack::{DirentSpec, ImageBuilder, InodeSpec};

    const SOURCE: CommandLineSource = CommandLineSource {
        parent: 1,
        name: "cmdline",
    };

    fn image_with(data: &[u8]) -> Vec<u8> {
        ImageBuilder::new()
            .dirent(DirentSpec::new(1, 1, 5, b"cmdline"))
            .unwrap()
            .inode(InodeSpec::new(5, 1).data(data))
            .build()
    }

    #[test]
    fn file_contents_fill_the_slot() {
        let bytes = image_with(b"console=ttyS0 root=/dev/mtdblock3\n");
        let mut tags = BootTagList::new();

        let outcome = extract(Image::new(&bytes), &SOURCE, &mut tags);
        assert_eq!(outcome, Extraction::Applied(33));
        assert_eq!(tags.command_line(), Some(&b"console=ttyS0 root=/dev/mtdblock3"[..]));
    }

    #[test]
    fn content_ends_at_the_first_nul() {
        let bytes = image_with(b"console=ttyS0\0garbage");
        let mut tags = BootTagList::new();

        assert_eq!(extract(Image::new(&bytes), &SOURCE, &mut tags), Extraction::Applied(13));
        assert_eq!(tags.command_line(), Some(&b"console=ttyS0"[..]));
    }

    #[test]
    fn missing_file_keeps_the_slot_inert() {
        let bytes = ImageBuilder::new()
            .dirent(DirentSpec::new(1, 1, 6, b"fstab"))
            .unwrap()
            .inode(InodeSpec::new(6, 1).data(b"/dev/root / jffs2"))
            .build();
        let mut tags = BootTagList::new();

        assert_eq!(extract(Image::new(&bytes), &SOURCE, &mut tags), Extraction::NoFile);
        assert_eq!(tags.command_line(), None);

        let slots = tags.slots();
        assert_eq!(slots.command_line.kind(), Some(BootTagId::Last));
        assert_eq!(slots.last.kind(), Some(BootTagId::Last));

        let ids: Vec<u16> = Tags::new(tags.as_bytes()).map(|t| t.unwrap().id).collect();
        assert_eq!(ids, vec![BootTagId::First.as_raw()]);
    }

    #[test]
    fn whitespace_only_file_is_empty() {
        let bytes = image_with(b" \n\n");
        let mut tags = BootTagList::new();
        assert_eq!(extract(Image::new(&bytes), &SOURCE, &mut tags), Extraction::Empty);
        assert_eq!(tags.command_line(), None);
    }

    #[test]
    fn dangling_entry_is_unreadable() {
        let bytes = ImageBuilder::new()
            .dirent(DirentSpec::new(1, 1, 9, b"cmdline"))
            .unwrap()
            .build();
        let mut tags = BootTagList::new();
        assert_eq!(
            extract(Image::new(&bytes), &SOURCE, &mut tags),
            Extraction::Unreadable(ReadError::InodeNotFound(9))
        );
    }

    #[test]
    fn oversized_file_is_rejected() {
        let long = [b'x'; COMMAND_LINE_MAX + 10];
        let bytes = image_with(&long);
        let mut tags = BootTagList::new();

        let outcome = extract(Image::new(&bytes), &SOURCE, &mut tags);
        assert_eq!(
            outcome,
            Extraction::Rejected(TagError::CommandLineTooLong {
                len: COMMAND_LINE_SIZE,
                max: COMMAND_LINE_MAX,
            })
        );
        assert!(!outcome.is_applied());
        assert_eq!(tags.command_line(), None);

        let fits = image_with(&long[..COMMAND_LINE_MAX]);
        assert_eq!(
            extract(Image::new(&fits), &SOURCE, &mut tags),
            Extraction::Applied(COMMAND_LINE_MAX)
        );
    }
}

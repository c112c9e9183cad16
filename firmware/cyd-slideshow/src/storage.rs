//! Storage seam: the SD card root as a sequential directory cursor.

use core::fmt;

use heapless::String;

use crate::config::{IMAGE_EXTENSIONS, MAX_NAME_LEN};
use crate::jpeg::ByteSource;

/// One entry of the root directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String<MAX_NAME_LEN>,
    pub is_dir: bool,
    pub size: u32,
}

impl DirEntry {
    /// Build an entry, or `None` when the name does not fit.
    pub fn new(name: &str, is_dir: bool, size: u32) -> Option<Self> {
        let mut owned = String::new();
        owned.push_str(name).ok()?;
        Some(Self {
            name: owned,
            is_dir,
            size,
        })
    }

    /// Regular file with an image extension
    pub fn is_slide(&self) -> bool {
        !self.is_dir && is_slide_name(&self.name)
    }
}

/// True when the lowercased name ends in `.jpg` or `.jpeg`.
pub fn is_slide_name(name: &str) -> bool {
    let name = name.as_bytes();
    IMAGE_EXTENSIONS.iter().any(|ext| {
        let ext = ext.as_bytes();
        name.len() >= ext.len() && name[name.len() - ext.len()..].eq_ignore_ascii_case(ext)
    })
}

/// Result of mounting the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardInfo {
    pub size_bytes: u64,
}

impl CardInfo {
    pub const fn size_mb(&self) -> u64 {
        self.size_bytes / (1024 * 1024)
    }
}

/// Filesystem the slideshow reads from.
///
/// The root is walked with `open_root`, repeated `next_entry` calls until
/// `Ok(None)`, then `close_root`. No position survives `close_root`.
pub trait Storage {
    type Error: fmt::Debug;

    /// Reader for one open file; closing happens on drop.
    type File<'a>: ByteSource
    where
        Self: 'a;

    /// Bring up the card and report its size.
    fn mount(&mut self) -> Result<CardInfo, Self::Error>;

    fn open_root(&mut self) -> Result<(), Self::Error>;

    /// Next entry of the open root, `Ok(None)` once exhausted.
    fn next_entry(&mut self) -> Result<Option<DirEntry>, Self::Error>;

    fn close_root(&mut self);

    /// Open a file in the root directory for reading.
    fn open_file(&mut self, name: &str) -> Result<Self::File<'_>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_name_matching() {
        assert!(is_slide_name("beach.jpg"));
        assert!(is_slide_name("BEACH.JPG"));
        assert!(is_slide_name("Holiday.JpEg"));
        assert!(is_slide_name(".jpg"));
        assert!(!is_slide_name("beach.png"));
        assert!(!is_slide_name("notes.jpg.txt"));
        assert!(!is_slide_name("jpg"));
        assert!(!is_slide_name(""));
    }

    #[test]
    fn test_directories_are_never_slides() {
        let dir = DirEntry::new("ALBUM.JPG", true, 0).unwrap();
        assert!(!dir.is_slide());
        let file = DirEntry::new("ALBUM.JPG", false, 1024).unwrap();
        assert!(file.is_slide());
    }

    #[test]
    fn test_long_names_are_rejected() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(DirEntry::new(&long, false, 0).is_none());
        let exact = "y".repeat(MAX_NAME_LEN);
        assert!(DirEntry::new(&exact, false, 0).is_some());
    }

    #[test]
    fn test_card_size_in_megabytes() {
        let card = CardInfo { size_bytes: 15_931_539_456 };
        assert_eq!(card.size_mb(), 15_193);
    }
}

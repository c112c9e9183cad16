//! Test doubles shared by the module tests.

use embedded_hal::delay::DelayNs;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::fade::Backlight;
use crate::storage::{CardInfo, DirEntry, Storage};

/// Remembers every level written.
#[derive(Debug, Default)]
pub(crate) struct RecordingBacklight {
    pub levels: Vec<u8>,
}

impl RecordingBacklight {
    pub fn last(&self) -> Option<u8> {
        self.levels.last().copied()
    }
}

impl Backlight for RecordingBacklight {
    fn set_level(&mut self, level: u8) {
        self.levels.push(level);
    }
}

/// Records millisecond sleeps instead of sleeping.
#[derive(Debug, Default)]
pub(crate) struct RecordingDelay {
    pub ms_calls: Vec<u32>,
}

impl RecordingDelay {
    pub fn count(&self, ms: u32) -> usize {
        self.ms_calls.iter().filter(|&&m| m == ms).count()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_us(&mut self, _us: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls.push(ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockError {
    NoCard,
    Io,
    NotFound,
}

#[derive(Debug, Clone)]
struct MockFile {
    name: String,
    is_dir: bool,
    data: Vec<u8>,
}

/// In-memory card root.
#[derive(Debug, Default)]
pub(crate) struct MockStorage {
    files: Vec<MockFile>,
    cursor: Option<usize>,
    pub card_bytes: u64,
    pub mount_fails: bool,
    pub open_root_fails: bool,
    /// `next_entry` fails when it reaches this index
    pub fail_entry_at: Option<usize>,
    pub opened: Vec<String>,
    pub root_opens: usize,
    pub root_closes: usize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            card_bytes: 8 * 1024 * 1024 * 1024,
            ..Self::default()
        }
    }

    pub fn file(mut self, name: &str, data: Vec<u8>) -> Self {
        self.files.push(MockFile {
            name: name.into(),
            is_dir: false,
            data,
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.files.push(MockFile {
            name: name.into(),
            is_dir: true,
            data: Vec::new(),
        });
        self
    }

    pub fn is_root_open(&self) -> bool {
        self.cursor.is_some()
    }
}

impl Storage for MockStorage {
    type Error = MockError;
    type File<'a> = &'a [u8];

    fn mount(&mut self) -> Result<CardInfo, Self::Error> {
        if self.mount_fails {
            return Err(MockError::NoCard);
        }
        Ok(CardInfo {
            size_bytes: self.card_bytes,
        })
    }

    fn open_root(&mut self) -> Result<(), Self::Error> {
        self.root_opens += 1;
        if self.open_root_fails {
            return Err(MockError::Io);
        }
        self.cursor = Some(0);
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<DirEntry>, Self::Error> {
        let index = self.cursor.ok_or(MockError::Io)?;
        if self.fail_entry_at == Some(index) {
            return Err(MockError::Io);
        }
        let Some(file) = self.files.get(index) else {
            return Ok(None);
        };
        self.cursor = Some(index + 1);
        Ok(DirEntry::new(&file.name, file.is_dir, file.data.len() as u32))
    }

    fn close_root(&mut self) {
        self.root_closes += 1;
        self.cursor = None;
    }

    fn open_file(&mut self, name: &str) -> Result<Self::File<'_>, Self::Error> {
        self.opened.push(name.into());
        self.files
            .iter()
            .find(|f| !f.is_dir && f.name == name)
            .map(|f| f.data.as_slice())
            .ok_or(MockError::NotFound)
    }
}

/// Encode an RGB image as a baseline JPEG.
pub(crate) fn encode_rgb(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(img)
        .unwrap();
    out
}

/// Solid-colour JPEG of the given size.
pub(crate) fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode_rgb(&RgbImage::from_pixel(width, height, image::Rgb(rgb)), 90)
}

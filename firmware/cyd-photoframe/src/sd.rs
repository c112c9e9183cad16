//! SD card storage over `embedded-sdmmc`.
//!
//! The root directory is read into a bounded snapshot when it is opened, so
//! files can be opened while the listing is walked. FAT short names only.

use core::fmt::Write;

use cyd_slideshow::config::MAX_NAME_LEN;
use cyd_slideshow::{ByteSource, CardInfo, DirEntry, Storage};
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use embedded_sdmmc::{
    Mode, RawDirectory, RawFile, RawVolume, SdCard, SdCardError, TimeSource, Timestamp,
    VolumeIdx, VolumeManager,
};
use heapless::{String, Vec};
use log::{debug, warn};

/// Root entries kept per listing; the rest are skipped with a warning.
pub const MAX_LISTING: usize = 128;

pub type SdError = embedded_sdmmc::Error<SdCardError>;

/// The frame never writes, so a fixed clock is enough.
pub struct FixedClock;

impl TimeSource for FixedClock {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 55,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

pub struct SdStorage<S, D>
where
    S: SpiDevice<u8>,
    D: DelayNs,
{
    volumes: VolumeManager<SdCard<S, D>, FixedClock>,
    volume: Option<RawVolume>,
    root: Option<RawDirectory>,
    listing: Vec<DirEntry, MAX_LISTING>,
    cursor: usize,
}

impl<S, D> SdStorage<S, D>
where
    S: SpiDevice<u8>,
    D: DelayNs,
{
    pub fn new(spi: S, delay: D) -> Self {
        Self {
            volumes: VolumeManager::new(SdCard::new(spi, delay), FixedClock),
            volume: None,
            root: None,
            listing: Vec::new(),
            cursor: 0,
        }
    }

    /// Run `f` on the card's SPI device, e.g. to raise the clock after init.
    pub fn with_spi<T>(&mut self, f: impl FnOnce(&mut S) -> T) -> T {
        self.volumes.device().spi(f)
    }

    fn volume(&mut self) -> Result<RawVolume, SdError> {
        if let Some(volume) = self.volume {
            return Ok(volume);
        }
        let volume = self.volumes.open_raw_volume(VolumeIdx(0))?;
        self.volume = Some(volume);
        Ok(volume)
    }
}

impl<S, D> Storage for SdStorage<S, D>
where
    S: SpiDevice<u8>,
    D: DelayNs,
{
    type Error = SdError;
    type File<'a>
        = SdFile<'a, S, D>
    where
        Self: 'a;

    fn mount(&mut self) -> Result<CardInfo, Self::Error> {
        let size_bytes = self
            .volumes
            .device()
            .num_bytes()
            .map_err(embedded_sdmmc::Error::DeviceError)?;
        self.volume()?;
        Ok(CardInfo { size_bytes })
    }

    fn open_root(&mut self) -> Result<(), Self::Error> {
        self.close_root();
        let volume = self.volume()?;
        let root = self.volumes.open_root_dir(volume)?;
        self.root = Some(root);

        let listing = &mut self.listing;
        let mut dropped = 0usize;
        let result = self.volumes.iterate_dir(root, |entry| {
            if entry.attributes.is_volume() || entry.attributes.is_lfn() {
                return;
            }
            let mut name: String<MAX_NAME_LEN> = String::new();
            if write!(name, "{}", entry.name).is_err() {
                dropped += 1;
                return;
            }
            let kept = DirEntry::new(&name, entry.attributes.is_directory(), entry.size)
                .map(|e| listing.push(e).is_ok())
                .unwrap_or(false);
            if !kept {
                dropped += 1;
            }
        });
        if dropped > 0 {
            warn!("sd: {} root entries not listed", dropped);
        }
        if let Err(e) = result {
            self.close_root();
            return Err(e);
        }
        debug!("sd: root has {} entries", self.listing.len());
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<DirEntry>, Self::Error> {
        let entry = self.listing.get(self.cursor).cloned();
        if entry.is_some() {
            self.cursor += 1;
        }
        Ok(entry)
    }

    fn close_root(&mut self) {
        if let Some(root) = self.root.take() {
            if let Err(e) = self.volumes.close_dir(root) {
                warn!("sd: closing root failed: {:?}", e);
            }
        }
        self.listing.clear();
        self.cursor = 0;
    }

    fn open_file(&mut self, name: &str) -> Result<Self::File<'_>, Self::Error> {
        let dir = match self.root {
            Some(root) => root,
            None => {
                let volume = self.volume()?;
                self.volumes.open_root_dir(volume)?
            }
        };
        let opened = self.volumes.open_file_in_dir(dir, name, Mode::ReadOnly);
        if self.root.is_none() {
            if let Err(e) = self.volumes.close_dir(dir) {
                warn!("sd: closing root failed: {:?}", e);
            }
        }
        Ok(SdFile {
            volumes: &mut self.volumes,
            file: opened?,
        })
    }
}

/// An open file; closed on drop.
pub struct SdFile<'a, S, D>
where
    S: SpiDevice<u8>,
    D: DelayNs,
{
    volumes: &'a mut VolumeManager<SdCard<S, D>, FixedClock>,
    file: RawFile,
}

impl<S, D> ByteSource for SdFile<'_, S, D>
where
    S: SpiDevice<u8>,
    D: DelayNs,
{
    type Error = SdError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.volumes.read(self.file, buf)
    }
}

impl<S, D> Drop for SdFile<'_, S, D>
where
    S: SpiDevice<u8>,
    D: DelayNs,
{
    fn drop(&mut self) {
        if let Err(e) = self.volumes.close_file(self.file) {
            warn!("sd: closing file failed: {:?}", e);
        }
    }
}

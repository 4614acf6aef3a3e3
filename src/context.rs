// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

use crate::headers::SectionHeader;

/// Executable format of the mapped image, as classified by the loader when
/// it validated the primary headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Terse Executable, the header-stripped PE variant used in pre-boot
    /// firmware volumes.
    Te,
    Pe32,
    Pe32Plus,
}

/// Process-wide feature flags, passed in explicitly so the walk stays pure.
#[derive(Debug, Clone, Copy)]
pub struct DebugConfig {
    /// When false, debug-info processing is disabled wholesale and every
    /// lookup reports `NotFound`.
    pub debug_support: bool,
    /// When true, TE images are disallowed entirely and the TE-stripped
    /// offset must be zero for every image that gets this far.
    pub prohibit_te: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            debug_support: true,
            prohibit_te: false,
        }
    }
}

/// Read-only view of a mapped image plus the header geometry the loader
/// established when it validated the primary headers.
///
/// The geometry fields (offsets, counts, stripped bytes) are trusted to be
/// internally consistent — the loader already checked them against the file
/// size. The bytes they point into are not trusted at all: everything the
/// debug walk reads through this context is re-validated before use.
#[derive(Debug, Clone, Copy)]
pub struct ImageContext<'a> {
    buffer: &'a [u8],
    image_kind: ImageKind,
    size_of_image: u32,
    exe_hdr_offset: u32,
    sections_offset: u32,
    num_sections: u16,
    te_stripped_offset: u32,
}

impl<'a> ImageContext<'a> {
    /// Wraps an already-validated image. Consistency of the geometry with
    /// the buffer is the caller's contract; violations are programming
    /// errors, not recoverable conditions.
    pub fn new(
        buffer: &'a [u8],
        image_kind: ImageKind,
        size_of_image: u32,
        exe_hdr_offset: u32,
        sections_offset: u32,
        num_sections: u16,
        te_stripped_offset: u32,
    ) -> Self {
        debug_assert!(u32::try_from(buffer.len()).is_ok());
        debug_assert!(exe_hdr_offset as usize <= buffer.len());
        debug_assert!(sections_offset as usize <= buffer.len());
        debug_assert!(image_kind == ImageKind::Te || te_stripped_offset == 0);
        Self {
            buffer,
            image_kind,
            size_of_image,
            exe_hdr_offset,
            sections_offset,
            num_sections,
            te_stripped_offset,
        }
    }

    #[inline(always)]
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Total length of the raw file, in the 32-bit offset domain every
    /// header field lives in.
    #[inline(always)]
    pub fn file_size(&self) -> u32 {
        self.buffer.len() as u32
    }

    #[inline(always)]
    pub fn image_kind(&self) -> ImageKind {
        self.image_kind
    }

    /// Total virtual size of the loaded image; RVA ranges are validated
    /// against this before any raw-offset translation.
    #[inline(always)]
    pub fn size_of_image(&self) -> u32 {
        self.size_of_image
    }

    #[inline(always)]
    pub fn exe_hdr_offset(&self) -> u32 {
        self.exe_hdr_offset
    }

    #[inline(always)]
    pub fn num_sections(&self) -> u16 {
        self.num_sections
    }

    /// Bytes the loader stripped from the on-disk header when the image was
    /// condensed into TE form. Zero for PE images.
    #[inline(always)]
    pub fn te_stripped_offset(&self) -> u32 {
        self.te_stripped_offset
    }

    /// Tail of the buffer starting at `offset`, empty when the offset is
    /// past the end. Overlays built on top of this fail their size check
    /// instead of reading out of bounds.
    #[inline(always)]
    pub fn bytes_at(&self, offset: usize) -> &'a [u8] {
        self.buffer.get(offset..).unwrap_or(&[])
    }

    /// Bytes of the format-specific executable header.
    #[inline(always)]
    pub fn exe_header_bytes(&self) -> &'a [u8] {
        self.bytes_at(self.exe_hdr_offset as usize)
    }

    /// Section descriptor at `index`, or `None` if the table runs off the
    /// end of the file.
    pub fn section(&self, index: u16) -> Option<SectionHeader<'a>> {
        let offset = self.sections_offset as usize + index as usize * SectionHeader::size();
        SectionHeader::new(self.bytes_at(offset))
    }
}

// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
//
// On-disk layouts of the PE/COFF and TE header structures the debug walk
// touches. Only the fields that are actually read get an offset entry; the
// const_asserts pin each overlay to the published structure size.
// https://learn.microsoft.com/windows/win32/debug/pe-format

use crate::overlay_both;
use static_assertions::const_assert;

/// Index of the debug slot in the PE data-directory array.
pub const DIR_ENTRY_DEBUG: u32 = 6;

/// Debug-directory entry type carrying a CodeView record.
pub const DEBUG_TYPE_CODEVIEW: u32 = 2;

/// Byte size of one debug-directory entry.
pub const DEBUG_ENTRY_SIZE: u32 = 28;

/// Natural alignment of a debug-directory entry, which is also the
/// alignment required of a CodeView record.
pub const DEBUG_ENTRY_ALIGN: u32 = 4;

/// CodeView signatures, little-endian over their ASCII tags.
pub const CV_SIGNATURE_NB10: u32 = u32::from_le_bytes(*b"NB10");
pub const CV_SIGNATURE_RSDS: u32 = u32::from_le_bytes(*b"RSDS");
pub const CV_SIGNATURE_MTOC: u32 = u32::from_le_bytes(*b"MTOC");

/// Sub-header bytes that sit between the signature and the PDB path for
/// each CodeView flavor.
pub const NB10_HEADER_SIZE: u32 = 12;
pub const RSDS_HEADER_SIZE: u32 = 24;
pub const MTOC_HEADER_SIZE: u32 = 20;

// Offsets below are relative to the executable-header offset the loader
// recorded, i.e. the PE signature for PE images and the TE signature for TE
// images.

/// Byte offset of the debug data-directory slot inside a PE32 header:
/// directories start at 0x78, debug is slot 6.
pub const PE32_DEBUG_DIR_SLOT: usize = 0x78 + 8 * DIR_ENTRY_DEBUG as usize;

/// Same slot for PE32+, whose optional header is 16 bytes longer.
pub const PE32PLUS_DEBUG_DIR_SLOT: usize = 0x88 + 8 * DIR_ENTRY_DEBUG as usize;

// TE strips the DOS stub and most of the optional header, leaving a 40-byte
// header whose directory array holds exactly two slots; debug is slot 1.
overlay_both!((pub TeHeader, pub TeHeaderMut) {
    [0x00] signature: u16,
    [0x02] machine: u16,
    [0x04] number_of_sections: u8,
    [0x05] subsystem: u8,
    [0x06] stripped_size: u16,
    [0x08] address_of_entry_point: u32,
    [0x0C] base_of_code: u32,
    [0x10] image_base: u64,
    [0x18] base_reloc_virtual_address: u32,
    [0x1C] base_reloc_size: u32,
    [0x20] debug_dir_virtual_address: u32,
    [0x24] debug_dir_size: u32,
});
const_assert!(TeHeader::size() == 0x28);

// PE headers, trimmed to the geometry the directory locator needs. The
// minimum size of each overlay lands exactly on its data-directory array,
// so an overlaid header proves the directory count field is in bounds but
// promises nothing about any slot beyond it.
overlay_both!((pub Pe32Header, pub Pe32HeaderMut) {
    [0x00] signature: u32,
    [0x18] magic: u16,
    [0x74] number_of_rva_and_sizes: u32,
});
const_assert!(Pe32Header::size() == 0x78);

overlay_both!((pub Pe32PlusHeader, pub Pe32PlusHeaderMut) {
    [0x00] signature: u32,
    [0x18] magic: u16,
    [0x84] number_of_rva_and_sizes: u32,
});
const_assert!(Pe32PlusHeader::size() == 0x88);

overlay_both!((pub DataDirectory, pub DataDirectoryMut) {
    [0x00] virtual_address: u32,
    [0x04] size: u32,
});
const_assert!(DataDirectory::size() == 0x08);

// The 8-byte name field is skipped; nothing in the walk cares about it and
// the trailing fields keep the overlay at the full 40-byte record size.
overlay_both!((pub SectionHeader, pub SectionHeaderMut) {
    [0x08] virtual_size: u32,
    [0x0C] virtual_address: u32,
    [0x10] size_of_raw_data: u32,
    [0x14] pointer_to_raw_data: u32,
    [0x18] pointer_to_relocations: u32,
    [0x1C] pointer_to_linenumbers: u32,
    [0x20] number_of_relocations: u16,
    [0x22] number_of_linenumbers: u16,
    [0x24] characteristics: u32,
});
const_assert!(SectionHeader::size() == 0x28);

overlay_both!((pub DebugDirectoryEntry, pub DebugDirectoryEntryMut) {
    [0x00] characteristics: u32,
    [0x04] time_date_stamp: u32,
    [0x08] major_version: u16,
    [0x0A] minor_version: u16,
    [0x0C] record_type: u32,
    [0x10] size_of_data: u32,
    [0x14] virtual_address: u32,
    [0x18] file_offset: u32,
});
const_assert!(DebugDirectoryEntry::size() == DEBUG_ENTRY_SIZE as usize);

// CodeView sub-headers. Only their sizes matter to the extractor; the
// overlays document the layouts and let tests populate realistic records.
// The GUID/UUID payloads are spelled as u32 words to keep the overlay
// grammar scalar-only.
overlay_both!((pub Nb10Entry, pub Nb10EntryMut) {
    [0x00] signature: u32,
    [0x04] offset: u32,
    [0x08] time_date_stamp: u32,
});
const_assert!(Nb10Entry::size() == NB10_HEADER_SIZE as usize);

overlay_both!((pub RsdsEntry, pub RsdsEntryMut) {
    [0x00] signature: u32,
    [0x04] guid_data1: u32,
    [0x08] guid_data2: u32,
    [0x0C] guid_data3: u32,
    [0x10] guid_data4: u32,
    [0x14] age: u32,
});
const_assert!(RsdsEntry::size() == RSDS_HEADER_SIZE as usize);

overlay_both!((pub MtocEntry, pub MtocEntryMut) {
    [0x00] signature: u32,
    [0x04] uuid_data1: u32,
    [0x08] uuid_data2: u32,
    [0x0C] uuid_data3: u32,
    [0x10] uuid_data4: u32,
});
const_assert!(MtocEntry::size() == MTOC_HEADER_SIZE as usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_entry_round_trip() {
        let mut raw = [0u8; 0x1C];
        {
            let mut entry = DebugDirectoryEntryMut::new(&mut raw).unwrap();
            entry.set_record_type(DEBUG_TYPE_CODEVIEW);
            entry.set_size_of_data(0x30);
            entry.set_file_offset(0x240);
        }
        let entry = DebugDirectoryEntry::new(&raw).unwrap();
        assert_eq!(entry.get_record_type(), DEBUG_TYPE_CODEVIEW);
        assert_eq!(entry.get_size_of_data(), 0x30);
        assert_eq!(entry.get_file_offset(), 0x240);
    }

    #[test]
    fn overlay_rejects_short_slices() {
        let raw = [0u8; 0x1B];
        assert!(DebugDirectoryEntry::new(&raw).is_none());
        assert!(SectionHeader::new(&raw).is_none());
    }

    #[test]
    fn codeview_signatures_match_their_tags() {
        assert_eq!(CV_SIGNATURE_NB10, 0x3031_424E);
        assert_eq!(CV_SIGNATURE_RSDS, 0x5344_5352);
        assert_eq!(CV_SIGNATURE_MTOC, 0x434F_544D);
    }

    #[test]
    fn section_header_little_endian_layout() {
        let mut raw = [0u8; 0x28];
        {
            let mut section = SectionHeaderMut::new(&mut raw).unwrap();
            section.set_virtual_address(0x1000);
            section.set_size_of_raw_data(0x200);
        }
        assert_eq!(&raw[0x0C..0x10], &[0x00, 0x10, 0x00, 0x00]);
        assert_eq!(&raw[0x10..0x14], &[0x00, 0x02, 0x00, 0x00]);
    }
}

// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
//
// Walks the debug directory of a mapped PE/COFF or TE image and digs out
// the embedded PDB path. Every offset in the chain comes from the image and
// is treated as hostile: each addition and subtraction is overflow-checked
// and each derived offset is re-validated against the image and file bounds
// before anything is read through it.

use crate::{
    context::{DebugConfig, ImageContext, ImageKind},
    error::DebugDirError,
    headers::{
        DataDirectory, DebugDirectoryEntry, Pe32Header, Pe32PlusHeader, TeHeader,
        CV_SIGNATURE_MTOC, CV_SIGNATURE_NB10, CV_SIGNATURE_RSDS, DEBUG_ENTRY_ALIGN,
        DEBUG_ENTRY_SIZE, DEBUG_TYPE_CODEVIEW, DIR_ENTRY_DEBUG, MTOC_HEADER_SIZE,
        NB10_HEADER_SIZE, PE32PLUS_DEBUG_DIR_SLOT, PE32_DEBUG_DIR_SLOT, RSDS_HEADER_SIZE,
    },
};
use scroll::{Pread, LE};

/// Borrowed view of a NUL-terminated PDB path inside the image buffer.
///
/// The view stays valid exactly as long as the buffer it was cut from; the
/// terminator is always present and counted by [`PdbPath::size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdbPath<'a> {
    bytes: &'a [u8],
}

impl<'a> PdbPath<'a> {
    /// The path including its NUL terminator.
    #[inline(always)]
    pub fn as_bytes_with_nul(&self) -> &'a [u8] {
        self.bytes
    }

    /// The path without the terminator.
    #[inline(always)]
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    /// Byte length including the terminator.
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// The path as UTF-8, when it is valid UTF-8. PDB paths written by
    /// non-Microsoft toolchains occasionally are not.
    pub fn to_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }
}

/// Extracts the PDB path recorded in the image's debug directory.
///
/// Returns [`DebugDirError::NotFound`] when the image simply carries no
/// usable symbol record (no debug directory, no CodeView entry, or debug
/// processing disabled by `config`), and [`DebugDirError::Unsupported`]
/// when debug metadata is present but structurally invalid — the caller may
/// treat the latter as grounds to reject the whole image.
pub fn pdb_path<'a>(
    context: &ImageContext<'a>,
    config: &DebugConfig,
) -> Result<PdbPath<'a>, DebugDirError> {
    if !config.debug_support {
        return Err(DebugDirError::NotFound);
    }

    let (dir_rva, dir_size) = locate_directory(context, config)?;
    if dir_size == 0 {
        return Err(DebugDirError::NotFound);
    }

    let dir_file_offset = directory_file_offset(context, config, dir_rva, dir_size)?;
    let entry = find_codeview_entry(context, dir_file_offset, dir_size / DEBUG_ENTRY_SIZE)?;
    extract_path(context, config, &entry)
}

/// Stage 1: select the debug data-directory descriptor from the
/// format-specific header. TE keeps it in a fixed slot; PE images may
/// declare too few directories to have one at all.
fn locate_directory(
    context: &ImageContext<'_>,
    config: &DebugConfig,
) -> Result<(u32, u32), DebugDirError> {
    match context.image_kind() {
        ImageKind::Te => {
            if config.prohibit_te {
                reject!("TE image while TE support is disabled");
            }
            let Some(te) = TeHeader::new(context.exe_header_bytes()) else {
                reject!("TE header runs off the end of the file");
            };
            Ok((te.get_debug_dir_virtual_address(), te.get_debug_dir_size()))
        }
        ImageKind::Pe32 => {
            let Some(hdr) = Pe32Header::new(context.exe_header_bytes()) else {
                reject!("PE32 header runs off the end of the file");
            };
            if hdr.get_number_of_rva_and_sizes() <= DIR_ENTRY_DEBUG {
                return Err(DebugDirError::NotFound);
            }
            let slot = context.exe_hdr_offset() as usize + PE32_DEBUG_DIR_SLOT;
            let Some(dir) = DataDirectory::new(context.bytes_at(slot)) else {
                reject!("debug data-directory slot runs off the end of the file");
            };
            Ok((dir.get_virtual_address(), dir.get_size()))
        }
        ImageKind::Pe32Plus => {
            let Some(hdr) = Pe32PlusHeader::new(context.exe_header_bytes()) else {
                reject!("PE32+ header runs off the end of the file");
            };
            if hdr.get_number_of_rva_and_sizes() <= DIR_ENTRY_DEBUG {
                return Err(DebugDirError::NotFound);
            }
            let slot = context.exe_hdr_offset() as usize + PE32PLUS_DEBUG_DIR_SLOT;
            let Some(dir) = DataDirectory::new(context.bytes_at(slot)) else {
                reject!("debug data-directory slot runs off the end of the file");
            };
            Ok((dir.get_virtual_address(), dir.get_size()))
        }
    }
}

/// Stage 2: translate the directory's RVA into a raw file offset by finding
/// the one section whose virtual range fully contains it. A directory that
/// crosses section boundaries or lies outside every section is structurally
/// invalid, never merely absent.
fn directory_file_offset(
    context: &ImageContext<'_>,
    config: &DebugConfig,
    dir_rva: u32,
    dir_size: u32,
) -> Result<u32, DebugDirError> {
    if dir_size % DEBUG_ENTRY_SIZE != 0 {
        reject!("debug directory size is not a whole number of entries");
    }

    let Some(dir_top) = dir_rva.checked_add(dir_size) else {
        reject!("debug directory range wraps the address space");
    };
    if dir_top > context.size_of_image() {
        reject!("debug directory exceeds the virtual image size");
    }

    let mut owner = None;
    for index in 0..context.num_sections() {
        let Some(section) = context.section(index) else {
            reject!("section table runs off the end of the file");
        };
        let virtual_address = section.get_virtual_address();
        let Some(virtual_top) = virtual_address.checked_add(section.get_virtual_size()) else {
            continue;
        };
        if dir_rva >= virtual_address && dir_top <= virtual_top {
            owner = Some(section);
            break;
        }
    }
    let Some(section) = owner else {
        reject!("debug directory is not contained in any section");
    };

    // Neither line can wrap: containment gives section start <= dir_rva,
    // and section_offset + dir_size == dir_top - section start, which
    // already fit in 32 bits above.
    let section_offset = dir_rva - section.get_virtual_address();
    let section_raw_top = section_offset + dir_size;
    if section_raw_top > section.get_size_of_raw_data() {
        reject!("debug directory exceeds the section's raw data");
    }

    let Some(mut file_offset) = section
        .get_pointer_to_raw_data()
        .checked_add(section_offset)
    else {
        reject!("debug directory file offset wraps");
    };

    if !config.prohibit_te {
        // A consistent context never strips more bytes than the first
        // section's raw pointer, so this cannot underflow for the loader's
        // own images; hostile section tables still get the checked path.
        debug_assert!(context.te_stripped_offset() <= section.get_pointer_to_raw_data());
        let Some(adjusted) = file_offset.checked_sub(context.te_stripped_offset()) else {
            reject!("stripped header bytes exceed the section's file offset");
        };
        file_offset = adjusted;
    } else {
        debug_assert!(context.te_stripped_offset() == 0);
    }

    if file_offset % DEBUG_ENTRY_ALIGN != 0 {
        reject!("debug directory file offset is misaligned");
    }

    Ok(file_offset)
}

/// Stage 3: first CodeView-typed entry wins; the table has no ordering
/// guarantee. Images may carry only checksum or repro records, which is an
/// absence, not an error.
fn find_codeview_entry<'a>(
    context: &ImageContext<'a>,
    dir_file_offset: u32,
    num_entries: u32,
) -> Result<DebugDirectoryEntry<'a>, DebugDirError> {
    for index in 0..num_entries {
        let offset = dir_file_offset as usize + index as usize * DebugDirectoryEntry::size();
        let Some(entry) = DebugDirectoryEntry::new(context.bytes_at(offset)) else {
            reject!("debug directory entry runs off the end of the file");
        };
        if entry.get_record_type() == DEBUG_TYPE_CODEVIEW {
            return Ok(entry);
        }
    }
    Err(DebugDirError::NotFound)
}

/// Stage 4: bound the CodeView record, dispatch on its signature, and cut
/// out the trailing NUL-terminated path.
fn extract_path<'a>(
    context: &ImageContext<'a>,
    config: &DebugConfig,
    entry: &DebugDirectoryEntry<'a>,
) -> Result<PdbPath<'a>, DebugDirError> {
    let size_of_data = entry.get_size_of_data();
    if size_of_data < core::mem::size_of::<u32>() as u32 {
        reject!("CodeView record is too small for a signature");
    }

    let mut data_offset = entry.get_file_offset();
    if !config.prohibit_te {
        let Some(adjusted) = data_offset.checked_sub(context.te_stripped_offset()) else {
            reject!("stripped header bytes exceed the CodeView record's offset");
        };
        data_offset = adjusted;
    } else {
        debug_assert!(context.te_stripped_offset() == 0);
    }

    let Some(data_top) = data_offset.checked_add(size_of_data) else {
        reject!("CodeView record range wraps");
    };
    if data_top > context.file_size() {
        reject!("CodeView record exceeds the file bounds");
    }
    if data_offset % DEBUG_ENTRY_ALIGN != 0 {
        reject!("CodeView record offset is misaligned");
    }

    // In bounds: data_top <= file_size == buffer.len().
    let record = &context.buffer()[data_offset as usize..data_top as usize];

    let signature = record.pread_with::<u32>(0, LE)?;
    let sub_header_size = match signature {
        CV_SIGNATURE_NB10 => NB10_HEADER_SIZE,
        CV_SIGNATURE_RSDS => RSDS_HEADER_SIZE,
        CV_SIGNATURE_MTOC => MTOC_HEADER_SIZE,
        _ => reject!("unknown CodeView signature"),
    };

    let Some(path_size) = size_of_data.checked_sub(sub_header_size) else {
        reject!("CodeView record is too small for its sub-header");
    };
    if path_size == 0 {
        reject!("CodeView record carries no path");
    }

    let path = &record[sub_header_size as usize..];
    if path[path.len() - 1] != 0 {
        reject!("PDB path is not NUL-terminated");
    }

    Ok(PdbPath { bytes: path })
}

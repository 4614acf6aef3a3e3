// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

/// Computes the minimum byte length an overlay needs, which is the max of
/// every field's offset + size.
#[macro_export]
macro_rules! overlay_min_size {
    () => { 0 };
    ([$off:literal] $name:ident: $ty:ty,) => ($off + core::mem::size_of::<$ty>());
    ([$off:literal] $name:ident: $ty:ty, $($next:tt)+) => {{
        let tail = $crate::overlay_min_size!($($next)*);
        let head = $off + core::mem::size_of::<$ty>();
        if tail < head {
            head
        } else {
            tail
        }
    }};
}

/// Generates a `get_<field>` accessor per field. All on-disk values are
/// little-endian, so reads go through `from_le_bytes` rather than any
/// pointer cast. The slice is already clamped to `MINIMUM_SIZE` by `new`.
#[macro_export]
macro_rules! overlay_get_gen {
    () => {};
    ([$off:literal] $name:ident: $ty:ty, $($next:tt)*) => {
        concat_idents::concat_idents!(get_name = get_, $name, {
            #[allow(dead_code)]
            #[inline(always)]
            pub fn get_name(&self) -> $ty {
                let mut raw = [0u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(&self.bytes[$off..$off + core::mem::size_of::<$ty>()]);
                <$ty>::from_le_bytes(raw)
            }
        });
        $crate::overlay_get_gen!($($next)*);
    };
}

/// Generates a `set_<field>` accessor per field, little-endian like the
/// getters.
#[macro_export]
macro_rules! overlay_set_gen {
    () => {};
    ([$off:literal] $name:ident: $ty:ty, $($next:tt)*) => {
        concat_idents::concat_idents!(set_name = set_, $name, {
            #[allow(dead_code)]
            #[inline(always)]
            pub fn set_name(&mut self, val: $ty) {
                self.bytes[$off..$off + core::mem::size_of::<$ty>()]
                    .copy_from_slice(&val.to_le_bytes());
            }
        });
        $crate::overlay_set_gen!($($next)*);
    };
}

#[macro_export]
macro_rules! overlay_debug_gen {
    ($struct_name:ident, $([$off:literal] $name:ident: $ty:ty,)*) => {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_struct(stringify!($struct_name))
                $(.field(stringify!($name), &{
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&self.bytes[$off..$off + core::mem::size_of::<$ty>()]);
                    <$ty>::from_le_bytes(raw)
                }))*
                .finish()
        }
    };
}

/// Read-only overlay over a borrowed byte slice. `new` fails if the slice
/// cannot hold every declared field, so the generated getters never go out
/// of bounds.
#[macro_export]
macro_rules! overlay {
    ($vis:vis $struct_name:ident { $($next:tt)* }) => {
        $vis struct $struct_name<'a> {
            bytes: &'a [u8],
        }
        impl<'a> $struct_name<'a> {
            const MINIMUM_SIZE: usize = $crate::overlay_min_size!($($next)*);
            #[allow(dead_code)]
            #[inline]
            pub fn new(bytes: &'a [u8]) -> Option<Self> {
                if bytes.len() >= Self::MINIMUM_SIZE {
                    Some(Self {
                        bytes: &bytes[0..Self::MINIMUM_SIZE],
                    })
                } else {
                    None
                }
            }
            #[allow(dead_code)]
            pub const fn size() -> usize {
                Self::MINIMUM_SIZE
            }
            $crate::overlay_get_gen!($($next)*);
        }
        impl<'a> core::fmt::Debug for $struct_name<'a> {
            $crate::overlay_debug_gen!($struct_name, $($next)*);
        }
    }
}

/// Mutable overlay, used to build fixture images in tests.
#[macro_export]
macro_rules! overlay_mut {
    ($vis:vis $struct_name:ident { $($next:tt)* }) => {
        $vis struct $struct_name<'a> {
            bytes: &'a mut [u8],
        }
        impl<'a> $struct_name<'a> {
            const MINIMUM_SIZE: usize = $crate::overlay_min_size!($($next)*);
            #[allow(dead_code)]
            #[inline]
            pub fn new(bytes: &'a mut [u8]) -> Option<Self> {
                if bytes.len() >= Self::MINIMUM_SIZE {
                    Some(Self {
                        bytes: &mut bytes[0..Self::MINIMUM_SIZE],
                    })
                } else {
                    None
                }
            }
            #[allow(dead_code)]
            pub const fn size() -> usize {
                Self::MINIMUM_SIZE
            }
            $crate::overlay_set_gen!($($next)*);
            $crate::overlay_get_gen!($($next)*);
        }
        impl<'a> core::fmt::Debug for $struct_name<'a> {
            $crate::overlay_debug_gen!($struct_name, $($next)*);
        }
    }
}

#[macro_export]
macro_rules! overlay_both {
    (($vis:vis $struct_name:ident, $vis_mut:vis $struct_name_mut:ident) { $($next:tt)* }) => {
        $crate::overlay!($vis $struct_name { $($next)* });
        $crate::overlay_mut!($vis_mut $struct_name_mut { $($next)* });
    }
}

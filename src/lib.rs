// ============================================================================
// src/lib.rs - Kernel Address-Space Region Registry
//
// エミュレートされたマシンの仮想/物理アドレス空間を、互いに素で型付き・
// 属性付きの領域に分割するレジストリ。ブート時に一度だけ構築され、
// 以降はアドレス分類クエリに応答する。
// ============================================================================
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod global;
pub mod layout;
pub mod region;

pub use error::LayoutError;
pub use layout::{AddressSpaceKind, MemoryLayout};
pub use region::{
    DerivedRegionExtents, LayoutRng, MemoryRegion, RegionArena, RegionAttributes, RegionHandle,
    RegionTree, RegionType, MAX_MEMORY_REGIONS,
};

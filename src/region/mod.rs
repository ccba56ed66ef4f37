// ============================================================================
// src/region/mod.rs - 領域レジストリ
//
// アドレス空間を互いに素な型付き区間へ分割するための3部品:
// ノード（区間レコード）、アリーナ（固定200スロットの追記専用ストレージ）、
// ツリー（アドレス順インデックスと刻み込み挿入・ランダム配置）。
// ============================================================================

pub mod arena;
pub mod node;
pub mod rng;
pub mod tree;
pub mod types;


pub use arena::{RegionArena, RegionHandle, MAX_MEMORY_REGIONS};
pub use node::MemoryRegion;
pub use rng::LayoutRng;
pub use tree::{DerivedRegionExtents, RegionTree};
pub use types::{RegionAttributes, RegionType};

// ============================================================================
// src/region/arena.rs - 領域ノードアリーナ
// ============================================================================

use alloc::vec::Vec;

use super::node::MemoryRegion;

/// アリーナが保持できる領域ノードの最大数
///
/// レイアウトはハードウェア/ファームウェア構成から静的に決まるため、
/// この上限はビルド時に既知。超過は実行時エラーではなく定義の欠陥。
pub const MAX_MEMORY_REGIONS: usize = 200;

/// アリーナ内スロットへのハンドル
///
/// ノードは解放されないので、ハンドルはアリーナの生存期間中ずっと有効。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHandle(u32);

impl RegionHandle {
    /// スロット番号を取得
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// 固定容量・追記専用の領域ノードアリーナ
///
/// ブート時の領域構築は一度きりの追記処理であり、個別解放のAPIは
/// 意図的に存在しない。ストレージはプロセス終了まで生きる。
#[derive(Debug)]
pub struct RegionArena {
    slots: Vec<MemoryRegion>,
}

impl RegionArena {
    /// 空のアリーナを作成
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_MEMORY_REGIONS),
        }
    }

    /// 次の空きスロットへノードを構築してハンドルを返す
    ///
    /// 容量超過はレイアウト定義の欠陥として停止する。
    pub fn allocate(&mut self, region: MemoryRegion) -> RegionHandle {
        assert!(
            self.slots.len() < MAX_MEMORY_REGIONS,
            "region arena exhausted ({} slots)",
            MAX_MEMORY_REGIONS
        );

        let handle = RegionHandle(self.slots.len() as u32);
        self.slots.push(region);
        handle
    }

    /// ハンドルからノードを参照
    #[inline]
    pub fn get(&self, handle: RegionHandle) -> &MemoryRegion {
        &self.slots[handle.index()]
    }

    /// ハンドルからノードを可変参照
    #[inline]
    pub fn get_mut(&mut self, handle: RegionHandle) -> &mut MemoryRegion {
        &mut self.slots[handle.index()]
    }

    /// 構築済みノード数
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// ノードが1つもないか
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 残りスロット数
    #[inline]
    pub fn remaining(&self) -> usize {
        MAX_MEMORY_REGIONS - self.slots.len()
    }
}

impl Default for RegionArena {
    fn default() -> Self {
        Self::new()
    }
}

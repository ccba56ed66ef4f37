// ============================================================================
// src/layout.rs - メモリレイアウト
//
// 仮想/物理の2本の領域木と、それらが共有するノードアリーナの所有者。
// ブートストラップ列は最上位スライスを insert_directly で敷き、
// その後の刻み込み挿入で型付きメモリマップを完成させる。
// ============================================================================

use crate::error::LayoutError;
use crate::region::{
    DerivedRegionExtents, LayoutRng, MemoryRegion, RegionArena, RegionAttributes, RegionTree,
    RegionType,
};

/// 対象アドレス空間の選択
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpaceKind {
    /// 仮想アドレス空間
    Virtual,
    /// 物理アドレス空間
    Physical,
}

/// メモリレイアウト
///
/// アリーナはプロセス全域の寿命を持ち、両方の木のノードを1つの
/// 200スロット予算から供給する。変更操作はブート時の単一スレッド
/// 区間でのみ行うこと。
#[derive(Debug)]
pub struct MemoryLayout {
    arena: RegionArena,
    virtual_tree: RegionTree,
    physical_tree: RegionTree,
    rng: LayoutRng,
}

impl MemoryLayout {
    /// レイアウトを作成
    ///
    /// `rng_seed` はランダム配置の再現に使う。
    pub fn new(rng_seed: u64) -> Self {
        log::debug!("layout: created (rng_seed={rng_seed:#x})");
        Self {
            arena: RegionArena::new(),
            virtual_tree: RegionTree::new(),
            physical_tree: RegionTree::new(),
            rng: LayoutRng::new(rng_seed),
        }
    }

    /// 指定空間の木を参照
    pub fn tree(&self, kind: AddressSpaceKind) -> &RegionTree {
        match kind {
            AddressSpaceKind::Virtual => &self.virtual_tree,
            AddressSpaceKind::Physical => &self.physical_tree,
        }
    }

    /// アリーナを参照
    pub fn arena(&self) -> &RegionArena {
        &self.arena
    }

    /// 残りノード予算
    pub fn remaining_regions(&self) -> usize {
        self.arena.remaining()
    }

    fn parts_mut(&mut self, kind: AddressSpaceKind) -> (&mut RegionArena, &mut RegionTree) {
        match kind {
            AddressSpaceKind::Virtual => (&mut self.arena, &mut self.virtual_tree),
            AddressSpaceKind::Physical => (&mut self.arena, &mut self.physical_tree),
        }
    }

    /// 最上位スライスの直接挿入（呼び出し側が互いに素を保証）
    pub fn insert_directly(
        &mut self,
        kind: AddressSpaceKind,
        address: u64,
        last_address: u64,
        attributes: RegionAttributes,
        type_id: RegionType,
    ) {
        let (arena, tree) = self.parts_mut(kind);
        tree.insert_directly(arena, address, last_address, attributes, type_id);
    }

    /// 刻み込み挿入
    pub fn insert(
        &mut self,
        kind: AddressSpaceKind,
        address: u64,
        size: u64,
        type_id: RegionType,
        new_attr: RegionAttributes,
        old_attr: RegionAttributes,
    ) -> Result<(), LayoutError> {
        let (arena, tree) = self.parts_mut(kind);
        tree.insert(arena, address, size, type_id, new_attr, old_attr)
    }

    /// 点検索
    pub fn find(&self, kind: AddressSpaceKind, address: u64) -> Option<&MemoryRegion> {
        self.tree(kind).find(&self.arena, address)
    }

    /// 点検索（可変版）
    pub fn find_modifiable(
        &mut self,
        kind: AddressSpaceKind,
        address: u64,
    ) -> Option<&mut MemoryRegion> {
        match kind {
            AddressSpaceKind::Virtual => self.virtual_tree.find_modifiable(&mut self.arena, address),
            AddressSpaceKind::Physical => {
                self.physical_tree.find_modifiable(&mut self.arena, address)
            }
        }
    }

    /// 型が完全一致する最初の領域
    pub fn find_by_type(&self, kind: AddressSpaceKind, type_id: RegionType) -> Option<&MemoryRegion> {
        self.tree(kind).find_by_type(&self.arena, type_id)
    }

    /// 型と属性が完全一致する最初の領域
    pub fn find_by_type_and_attribute(
        &self,
        kind: AddressSpaceKind,
        type_id: RegionType,
        attributes: RegionAttributes,
    ) -> Option<&MemoryRegion> {
        self.tree(kind)
            .find_by_type_and_attribute(&self.arena, type_id, attributes)
    }

    /// 指定型へ派生する最初の領域
    pub fn find_first_derived(
        &self,
        kind: AddressSpaceKind,
        type_id: RegionType,
    ) -> Option<&MemoryRegion> {
        self.tree(kind).find_first_derived(&self.arena, type_id)
    }

    /// 指定型へ派生する最後の領域
    pub fn find_last_derived(
        &self,
        kind: AddressSpaceKind,
        type_id: RegionType,
    ) -> Option<&MemoryRegion> {
        self.tree(kind).find_last_derived(&self.arena, type_id)
    }

    /// 指定型の派生両端を取得
    pub fn derived_region_extents(
        &self,
        kind: AddressSpaceKind,
        type_id: RegionType,
    ) -> DerivedRegionExtents<'_> {
        self.tree(kind).derived_region_extents(&self.arena, type_id)
    }

    /// 派生領域内からアラインされたランダムアドレスを選ぶ
    pub fn random_aligned_region(
        &mut self,
        kind: AddressSpaceKind,
        size: u64,
        alignment: u64,
        type_id: RegionType,
    ) -> u64 {
        match kind {
            AddressSpaceKind::Virtual => self.virtual_tree.get_random_aligned_region(
                &self.arena,
                &mut self.rng,
                size,
                alignment,
                type_id,
            ),
            AddressSpaceKind::Physical => self.physical_tree.get_random_aligned_region(
                &self.arena,
                &mut self.rng,
                size,
                alignment,
                type_id,
            ),
        }
    }

    /// ガード帯付きランダム配置
    pub fn random_aligned_region_with_guard(
        &mut self,
        kind: AddressSpaceKind,
        size: u64,
        alignment: u64,
        type_id: RegionType,
        guard_size: u64,
    ) -> u64 {
        match kind {
            AddressSpaceKind::Virtual => self.virtual_tree.get_random_aligned_region_with_guard(
                &self.arena,
                &mut self.rng,
                size,
                alignment,
                type_id,
                guard_size,
            ),
            AddressSpaceKind::Physical => self.physical_tree.get_random_aligned_region_with_guard(
                &self.arena,
                &mut self.rng,
                size,
                alignment,
                type_id,
                guard_size,
            ),
        }
    }
}

// ============================================================================
// src/region/tree.rs - 領域ツリー（アドレス順序付き区間インデックス）
// ============================================================================
//!
//! 領域ノードをアドレス範囲でキー付けする順序付きインデックス。
//!
//! 元設計の侵入型平衡木は「プローブアドレスが格納区間に含まれれば等価」と
//! みなす比較器で O(log n) の点検索を実現していた。ここでは開始アドレスを
//! キーとする `BTreeMap` に対して `range(..=addr).next_back()` + 包含チェック
//! を行うことで同じ漸近計算量を得る。ノード本体はアリーナが所有し、木は
//! 構造リンク（ハンドル）だけを持つ。

use alloc::collections::BTreeMap;

use crate::error::LayoutError;

use super::arena::{RegionArena, RegionHandle};
use super::node::MemoryRegion;
use super::rng::LayoutRng;
use super::types::{RegionAttributes, RegionType};

/// 指定型へ派生する全領域を挟む両端
///
/// `[address(), last_address()]` は派生集合全体を覆うが、間に他分類の
/// 穴があり得る。呼び出し側は連続性を仮定してはならない。
#[derive(Debug)]
pub struct DerivedRegionExtents<'a> {
    /// アドレス順で最初の派生領域
    pub first_region: &'a MemoryRegion,
    /// アドレス順で最後の派生領域
    pub last_region: &'a MemoryRegion,
}

impl DerivedRegionExtents<'_> {
    /// 両端の開始アドレス
    #[inline]
    pub fn address(&self) -> u64 {
        self.first_region.address()
    }

    /// 両端の終端アドレス（含む）
    #[inline]
    pub fn last_address(&self) -> u64 {
        self.last_region.last_address()
    }

    /// 終端の次のアドレス
    #[inline]
    pub fn end_address(&self) -> u64 {
        self.last_address().wrapping_add(1)
    }

    /// 両端が張る範囲のサイズ
    #[inline]
    pub fn size(&self) -> u64 {
        self.end_address().wrapping_sub(self.address())
    }
}

/// 領域ツリー
///
/// 互いに素な領域の順序付き集合。挿入されていない隙間は「未分類」を意味
/// する。変更（挿入・刻み込み）はブート時の単一スレッド区間でのみ行い、
/// 並行クエリとの直列化は呼び出し側の責務。
#[derive(Debug, Default)]
pub struct RegionTree {
    /// 開始アドレス → アリーナハンドル
    nodes: BTreeMap<u64, RegionHandle>,
}

impl RegionTree {
    /// 空の木を作成
    pub const fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// アドレスを包含する領域の (開始キー, ハンドル)
    fn lookup(&self, arena: &RegionArena, address: u64) -> Option<(u64, RegionHandle)> {
        let (&key, &handle) = self.nodes.range(..=address).next_back()?;
        if arena.get(handle).contains(address) {
            Some((key, handle))
        } else {
            None
        }
    }

    /// 点検索: アドレスを包含する領域を返す
    pub fn find<'a>(&self, arena: &'a RegionArena, address: u64) -> Option<&'a MemoryRegion> {
        self.lookup(arena, address).map(|(_, handle)| arena.get(handle))
    }

    /// 点検索（可変版）
    pub fn find_modifiable<'a>(
        &self,
        arena: &'a mut RegionArena,
        address: u64,
    ) -> Option<&'a mut MemoryRegion> {
        let (_, handle) = self.lookup(arena, address)?;
        Some(arena.get_mut(handle))
    }

    /// 型が完全一致する最初の領域（アドレス順の線形走査）
    pub fn find_by_type<'a>(
        &self,
        arena: &'a RegionArena,
        type_id: RegionType,
    ) -> Option<&'a MemoryRegion> {
        self.nodes
            .values()
            .map(|&handle| arena.get(handle))
            .find(|region| region.type_id() == type_id)
    }

    /// 型と属性が共に完全一致する最初の領域
    pub fn find_by_type_and_attribute<'a>(
        &self,
        arena: &'a RegionArena,
        type_id: RegionType,
        attributes: RegionAttributes,
    ) -> Option<&'a MemoryRegion> {
        self.nodes
            .values()
            .map(|&handle| arena.get(handle))
            .find(|region| region.type_id() == type_id && region.attributes() == attributes)
    }

    /// 指定型へ派生するアドレス順最初の領域
    pub fn find_first_derived<'a>(
        &self,
        arena: &'a RegionArena,
        type_id: RegionType,
    ) -> Option<&'a MemoryRegion> {
        self.nodes
            .values()
            .map(|&handle| arena.get(handle))
            .find(|region| region.is_derived_from(type_id))
    }

    /// 指定型へ派生するアドレス順最後の領域
    pub fn find_last_derived<'a>(
        &self,
        arena: &'a RegionArena,
        type_id: RegionType,
    ) -> Option<&'a MemoryRegion> {
        self.nodes
            .values()
            .rev()
            .map(|&handle| arena.get(handle))
            .find(|region| region.is_derived_from(type_id))
    }

    /// 指定型へ派生する全領域の両端を取得
    ///
    /// 派生領域がひとつも無いのはレイアウト定義の欠陥として停止する。
    pub fn derived_region_extents<'a>(
        &self,
        arena: &'a RegionArena,
        type_id: RegionType,
    ) -> DerivedRegionExtents<'a> {
        let first_region = self
            .find_first_derived(arena, type_id)
            .unwrap_or_else(|| panic!("no region derives from {type_id:?}"));
        let last_region = self
            .find_last_derived(arena, type_id)
            .unwrap_or_else(|| panic!("no region derives from {type_id:?}"));

        DerivedRegionExtents {
            first_region,
            last_region,
        }
    }

    /// 既存領域と交差しない新領域を直接挿入する
    ///
    /// ブート初期にアドレス空間全体を最上位スライスへ切り出すための操作。
    /// 互いに素であることは呼び出し側が保証する（デバッグビルドでは検査）。
    pub fn insert_directly(
        &mut self,
        arena: &mut RegionArena,
        address: u64,
        last_address: u64,
        attributes: RegionAttributes,
        type_id: RegionType,
    ) {
        debug_assert!(address <= last_address);
        debug_assert!(
            !self.overlaps_existing(arena, address, last_address),
            "direct insert overlaps an existing region"
        );

        let handle = arena.allocate(MemoryRegion::with_type(
            address,
            last_address,
            attributes,
            type_id,
        ));
        self.nodes.insert(address, handle);

        #[cfg(feature = "verbose_logging")]
        log::trace!(
            "region: direct insert [{:#x}, {:#x}] type={:?}",
            address,
            last_address,
            type_id
        );
    }

    /// 刻み込み挿入: 既存領域を分割して細分型の部分領域を埋め込む
    ///
    /// `[address, address+size-1]` 全体を包含する既存領域Rが必要で、Rの属性は
    /// `old_attr` と完全一致し、Rの型から `type_id` へ派生可能でなければ
    /// ならない。Rは最大3片に分割される: 前方片と後方片はRの型・属性を保持
    /// し、中央片が `type_id`/`new_attr` を受け取る。Rにペアアドレスが設定
    /// されている場合、各片はスライス位置分ずらしたペアを引き継ぐ。
    ///
    /// 分割片は構造変更の前に確定させるため、部分分割状態が外部から観測
    /// されることはない。
    pub fn insert(
        &mut self,
        arena: &mut RegionArena,
        address: u64,
        size: u64,
        type_id: RegionType,
        new_attr: RegionAttributes,
        old_attr: RegionAttributes,
    ) -> Result<(), LayoutError> {
        debug_assert!(size > 0);
        let last_address = match address.checked_add(size - 1) {
            Some(last) => last,
            // アドレス空間の終端を越える範囲はどの領域にも包含されない
            None => return Err(LayoutError::RangeNotCovered),
        };

        let (key, handle) = self
            .lookup(arena, address)
            .ok_or(LayoutError::RegionNotFound)?;
        let found = arena.get(handle).clone();

        if found.last_address() < last_address {
            return Err(LayoutError::RangeNotCovered);
        }
        if found.attributes() != old_attr {
            return Err(LayoutError::AttributeMismatch);
        }
        if !found.can_derive(type_id) {
            return Err(LayoutError::InvalidDerivation);
        }

        // 検証済み。分割片を確定してから木を書き換える。
        let pair_for = |piece_address: u64| -> u64 {
            if found.pair_address() == MemoryRegion::UNSET_PAIR_ADDRESS {
                MemoryRegion::UNSET_PAIR_ADDRESS
            } else {
                found.pair_address() + (piece_address - found.address())
            }
        };
        let before = (found.address() < address).then(|| (found.address(), address - 1));
        let after = (last_address < found.last_address()).then(|| (last_address + 1, found.last_address()));

        // 包含ノードのスロットは中央片として再利用する
        self.nodes.remove(&key);
        arena
            .get_mut(handle)
            .reset(address, last_address, pair_for(address), new_attr, type_id);
        self.nodes.insert(address, handle);

        for (piece_address, piece_last) in before.into_iter().chain(after) {
            let piece_handle = arena.allocate(MemoryRegion::with_pair(
                piece_address,
                piece_last,
                pair_for(piece_address),
                found.attributes(),
                found.type_id(),
            ));
            self.nodes.insert(piece_address, piece_handle);
        }

        #[cfg(feature = "verbose_logging")]
        log::trace!(
            "region: carved [{:#x}, {:#x}] type={:?} out of [{:#x}, {:#x}]",
            address,
            last_address,
            type_id,
            found.address(),
            found.last_address()
        );

        Ok(())
    }

    /// 指定型の派生領域内から、アラインされたランダムアドレスを選ぶ
    ///
    /// 返る窓 `[a, a+size-1]` は単一の派生領域に完全に含まれる。候補が
    /// 存在しない要求はレイアウト定義の欠陥として停止する。
    pub fn get_random_aligned_region(
        &self,
        arena: &RegionArena,
        rng: &mut LayoutRng,
        size: u64,
        alignment: u64,
        type_id: RegionType,
    ) -> u64 {
        assert!(size > 0);
        assert!(alignment > 0);

        let extents = self.derived_region_extents(arena, type_id);
        assert!(
            extents.address() % alignment == 0,
            "derived extents base must be aligned"
        );

        // 棄却サンプリングが必ず当たりを引けることを先に検証しておく
        assert!(
            self.has_aligned_candidate(arena, size, alignment, type_id),
            "no derived region has an aligned window of the requested size"
        );

        let first_index = extents.address() / alignment;
        let last_index = extents.last_address() / alignment;

        loop {
            let candidate = rng.next_range(first_index, last_index) * alignment;

            let candidate_last = match candidate.checked_add(size - 1) {
                Some(last) => last,
                None => continue,
            };
            if candidate_last > extents.last_address() {
                continue;
            }

            let Some(region) = self.find(arena, candidate) else {
                continue;
            };
            if !region.is_derived_from(type_id) {
                continue;
            }
            if candidate_last > region.last_address() {
                continue;
            }

            return candidate;
        }
    }

    /// ガード帯付きのランダム配置
    ///
    /// `size + 2*guard_size` の窓を探索し、返すアドレスを内側へ `guard_size`
    /// ずらす。窓の両側に未使用のガード帯が同じ派生領域内に確保され、
    /// 隣接越界アクセスへの防壁になる。
    pub fn get_random_aligned_region_with_guard(
        &self,
        arena: &RegionArena,
        rng: &mut LayoutRng,
        size: u64,
        alignment: u64,
        type_id: RegionType,
        guard_size: u64,
    ) -> u64 {
        self.get_random_aligned_region(arena, rng, size + 2 * guard_size, alignment, type_id)
            + guard_size
    }

    /// アドレス順で全領域を走査
    pub fn iter<'a>(&'a self, arena: &'a RegionArena) -> impl Iterator<Item = &'a MemoryRegion> {
        self.nodes.values().map(move |&handle| arena.get(handle))
    }

    /// 挿入済み領域数
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 領域が1つもないか
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// アドレス順で最初の領域
    pub fn first<'a>(&self, arena: &'a RegionArena) -> Option<&'a MemoryRegion> {
        self.nodes.values().next().map(|&handle| arena.get(handle))
    }

    /// アドレス順で最後の領域
    pub fn last<'a>(&self, arena: &'a RegionArena) -> Option<&'a MemoryRegion> {
        self.nodes.values().next_back().map(|&handle| arena.get(handle))
    }

    /// 要求サイズのアラインされた窓を収められる派生領域があるか
    fn has_aligned_candidate(
        &self,
        arena: &RegionArena,
        size: u64,
        alignment: u64,
        type_id: RegionType,
    ) -> bool {
        self.nodes
            .values()
            .map(|&handle| arena.get(handle))
            .any(|region| {
                if !region.is_derived_from(type_id) {
                    return false;
                }
                let rem = region.address() % alignment;
                let aligned = if rem == 0 {
                    region.address()
                } else {
                    match region.address().checked_add(alignment - rem) {
                        Some(aligned) => aligned,
                        None => return false,
                    }
                };
                match aligned.checked_add(size - 1) {
                    Some(last) => last <= region.last_address(),
                    None => false,
                }
            })
    }

    /// `[address, last_address]` が既存領域と交差するか
    fn overlaps_existing(&self, arena: &RegionArena, address: u64, last_address: u64) -> bool {
        match self.nodes.range(..=last_address).next_back() {
            Some((_, &handle)) => arena.get(handle).last_address() >= address,
            None => false,
        }
    }
}

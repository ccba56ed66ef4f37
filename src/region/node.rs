// ============================================================================
// src/region/node.rs - 領域ノード
// ============================================================================

use super::types::{RegionAttributes, RegionType};

/// 領域ノード
///
/// 互いに素なアドレス区間 `[address, last_address]` と、その分類
/// （型ビットマスク・属性マスク・対応領域アドレス）を運ぶ不変レコード。
/// ストレージはアリーナが所有し、木はハンドル経由で参照する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    /// 開始アドレス
    address: u64,
    /// 終端アドレス（含む）
    last_address: u64,
    /// 対応領域のアドレス（線形マップ相手など）
    pair_address: u64,
    /// 属性マスク
    attributes: RegionAttributes,
    /// 型ビットマスク
    type_id: RegionType,
}

impl MemoryRegion {
    /// ペアアドレス未設定を表す番兵値
    pub const UNSET_PAIR_ADDRESS: u64 = u64::MAX;

    /// 型・属性なしの領域を作成
    pub const fn new(address: u64, last_address: u64) -> Self {
        Self::with_type(
            address,
            last_address,
            RegionAttributes::empty(),
            RegionType::empty(),
        )
    }

    /// 型・属性付きの領域を作成
    pub const fn with_type(
        address: u64,
        last_address: u64,
        attributes: RegionAttributes,
        type_id: RegionType,
    ) -> Self {
        Self::with_pair(
            address,
            last_address,
            Self::UNSET_PAIR_ADDRESS,
            attributes,
            type_id,
        )
    }

    /// 全フィールド指定で領域を作成
    pub const fn with_pair(
        address: u64,
        last_address: u64,
        pair_address: u64,
        attributes: RegionAttributes,
        type_id: RegionType,
    ) -> Self {
        Self {
            address,
            last_address,
            pair_address,
            attributes,
            type_id,
        }
    }

    /// 刻み込み分割でスロットを再利用する際の再初期化
    pub(crate) fn reset(
        &mut self,
        address: u64,
        last_address: u64,
        pair_address: u64,
        attributes: RegionAttributes,
        type_id: RegionType,
    ) {
        self.address = address;
        self.last_address = last_address;
        self.pair_address = pair_address;
        self.attributes = attributes;
        self.type_id = type_id;
    }

    /// 開始アドレスを取得
    #[inline]
    pub const fn address(&self) -> u64 {
        self.address
    }

    /// 終端アドレス（含む）を取得
    #[inline]
    pub const fn last_address(&self) -> u64 {
        self.last_address
    }

    /// 終端の次のアドレスを取得（u64::MAX終端はラップして0になる）
    #[inline]
    pub const fn end_address(&self) -> u64 {
        self.last_address.wrapping_add(1)
    }

    /// 領域サイズを取得
    #[inline]
    pub const fn size(&self) -> u64 {
        self.end_address().wrapping_sub(self.address)
    }

    /// ペアアドレスを取得
    #[inline]
    pub const fn pair_address(&self) -> u64 {
        self.pair_address
    }

    /// ペアアドレスを設定
    #[inline]
    pub fn set_pair_address(&mut self, pair_address: u64) {
        self.pair_address = pair_address;
    }

    /// 属性マスクを取得
    #[inline]
    pub const fn attributes(&self) -> RegionAttributes {
        self.attributes
    }

    /// 型ビットマスクを取得
    #[inline]
    pub const fn type_id(&self) -> RegionType {
        self.type_id
    }

    /// アドレスが領域内かチェック
    ///
    /// ゼロ幅（未初期化）レコードでの呼び出しはレイアウト定義の欠陥。
    pub fn contains(&self, address: u64) -> bool {
        assert!(self.end_address() != 0, "contains() on a degenerate region");
        self.address <= address && address <= self.last_address
    }

    /// 先祖型から派生しているかチェック（先祖のビット ⊆ 自型のビット）
    #[inline]
    pub fn is_derived_from(&self, type_id: RegionType) -> bool {
        self.type_id.contains(type_id)
    }

    /// 指定型へ細分化できるかチェック（自型のビット ⊆ 新型のビット）
    #[inline]
    pub fn can_derive(&self, type_id: RegionType) -> bool {
        type_id.contains(self.type_id)
    }

    /// 型を細分化する
    ///
    /// ビットを落とす・無関係な型へ付け替える変更はレイアウト定義の欠陥と
    /// して停止する。
    pub fn set_type(&mut self, type_id: RegionType) {
        assert!(
            self.can_derive(type_id),
            "region type {:?} cannot derive {:?}",
            self.type_id,
            type_id
        );
        self.type_id = type_id;
    }

    /// 型フィールドへ目印ビットを追加する（無条件の単調細分）
    #[inline]
    pub fn set_type_attribute(&mut self, bits: RegionType) {
        self.type_id |= bits;
    }

    /// 型フィールドの目印ビットが立っているかチェック
    #[inline]
    pub fn has_type_attribute(&self, bits: RegionType) -> bool {
        self.type_id.contains(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_end_address() {
        let region = MemoryRegion::new(0x1000, 0x1FFF);
        assert_eq!(region.size(), 0x1000);
        assert_eq!(region.end_address(), 0x2000);

        // u64::MAX終端はラップする
        let top = MemoryRegion::new(u64::MAX - 0xFFF, u64::MAX);
        assert_eq!(top.end_address(), 0);
        assert_eq!(top.size(), 0x1000);
    }

    #[test]
    fn test_contains_bounds() {
        let region = MemoryRegion::new(0x1000, 0x1FFF);
        assert!(region.contains(0x1000));
        assert!(region.contains(0x1800));
        assert!(region.contains(0x1FFF));
        assert!(!region.contains(0xFFF));
        assert!(!region.contains(0x2000));
    }

    #[test]
    #[should_panic(expected = "degenerate region")]
    fn test_contains_degenerate_region_panics() {
        // last_address = u64::MAX かつ address = 0 は end_address が 0 になる
        let region = MemoryRegion::new(0, u64::MAX);
        let _ = region.contains(0);
    }

    #[test]
    fn test_derivation_laws() {
        let region = MemoryRegion::with_type(
            0,
            0xFFF,
            RegionAttributes::empty(),
            RegionType::KERNEL_CODE,
        );

        // 空型からは常に派生している
        assert!(region.is_derived_from(RegionType::empty()));
        assert!(region.is_derived_from(RegionType::DRAM));
        assert!(region.is_derived_from(RegionType::KERNEL));
        assert!(region.is_derived_from(RegionType::KERNEL_CODE));
        assert!(!region.is_derived_from(RegionType::IO));
        assert!(!region.is_derived_from(RegionType::KERNEL_STACK));
    }

    #[test]
    fn test_set_type_is_idempotent_and_transitive() {
        let mut region =
            MemoryRegion::with_type(0, 0xFFF, RegionAttributes::empty(), RegionType::DRAM);

        // 冪等性: 同じ型を二度設定しても変化しない
        region.set_type(RegionType::KERNEL);
        let after_first = region.type_id();
        region.set_type(RegionType::KERNEL);
        assert_eq!(region.type_id(), after_first);

        // 推移性: KERNEL経由の細分は直接KERNEL_POOLを設定したのと同じ
        region.set_type(RegionType::KERNEL_POOL);
        let mut direct =
            MemoryRegion::with_type(0, 0xFFF, RegionAttributes::empty(), RegionType::DRAM);
        direct.set_type(RegionType::KERNEL_POOL);
        assert_eq!(region.type_id(), direct.type_id());
    }

    #[test]
    #[should_panic(expected = "cannot derive")]
    fn test_set_type_rejects_narrowing() {
        let mut region = MemoryRegion::with_type(
            0,
            0xFFF,
            RegionAttributes::empty(),
            RegionType::KERNEL_CODE,
        );
        // KERNEL は KERNEL_CODE より粗いので巻き戻しは不可
        region.set_type(RegionType::KERNEL);
    }

    #[test]
    fn test_type_attribute_bits() {
        let mut region =
            MemoryRegion::with_type(0, 0xFFF, RegionAttributes::empty(), RegionType::KERNEL_POOL);
        assert!(!region.has_type_attribute(RegionType::LINEAR_MAPPED));

        region.set_type_attribute(RegionType::LINEAR_MAPPED);
        assert!(region.has_type_attribute(RegionType::LINEAR_MAPPED));
        // 既存の型ビットは保持される
        assert!(region.is_derived_from(RegionType::KERNEL_POOL));
    }

    #[test]
    fn test_pair_address_defaults_unset() {
        let region = MemoryRegion::new(0, 0xFFF);
        assert_eq!(region.pair_address(), MemoryRegion::UNSET_PAIR_ADDRESS);

        let mut region = region;
        region.set_pair_address(0xFFFF_0000);
        assert_eq!(region.pair_address(), 0xFFFF_0000);
    }
}

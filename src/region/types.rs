// ============================================================================
// src/region/types.rs - 領域型ビットマスクと属性マスク
// ============================================================================
#![allow(dead_code)]

use bitflags::bitflags;

bitflags! {
    /// 領域型ビットマスク
    ///
    /// 値は列挙子ではなく派生半順序（poset）を符号化する。型Aが粗い分類Cから
    /// 派生する ⇔ Cのビット集合 ⊆ Aのビット集合。細分型は必ず親のビットを
    /// 含むため、`contains` がそのまま派生判定になる。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionType: u32 {
        /// DRAM上の領域
        const DRAM = 1 << 0;
        /// I/O窓
        const IO = 1 << 1;

        /// カーネル占有領域（DRAMの細分）
        const KERNEL = Self::DRAM.bits() | 1 << 2;
        /// カーネルコード
        const KERNEL_CODE = Self::KERNEL.bits() | 1 << 3;
        /// カーネルスタック
        const KERNEL_STACK = Self::KERNEL.bits() | 1 << 4;
        /// カーネルプール
        const KERNEL_POOL = Self::KERNEL.bits() | 1 << 5;
        /// カーネル雑領域（ページテーブル・初期化データ等）
        const KERNEL_MISC = Self::KERNEL.bits() | 1 << 6;

        /// アプリケーション用領域
        const APPLICATION = Self::DRAM.bits() | 1 << 7;
        /// アプレット用領域
        const APPLET = Self::DRAM.bits() | 1 << 8;
        /// システム予約領域
        const SYSTEM = Self::DRAM.bits() | 1 << 9;

        /// デバイスレジスタ窓（IOの細分)
        const IO_DEVICE = Self::IO.bits() | 1 << 10;
        /// メモリマップドI/O窓
        const IO_MEMORY = Self::IO.bits() | 1 << 11;

        /// 線形マップ対応あり（型フィールドに立てる目印ビット）
        const LINEAR_MAPPED = 1 << 12;
    }
}

bitflags! {
    /// 領域属性マスク
    ///
    /// 派生関係とは独立の完全一致キー。キャッシュ/マップ方針のヒントを運ぶ。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionAttributes: u32 {
        /// キャッシュ可能
        const CACHED = 1 << 0;
        /// キャッシュ不可
        const UNCACHED = 1 << 1;
        /// デバイスメモリ
        const DEVICE = 1 << 2;
        /// ユーザマップ禁止
        const NO_USER_MAP = 1 << 3;
    }
}

impl Default for RegionType {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for RegionAttributes {
    fn default() -> Self {
        Self::empty()
    }
}

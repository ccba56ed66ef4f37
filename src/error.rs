//! 統一エラーハンドリングモジュール
//!
//! 刻み込み挿入（carving insert）の検証で発生する回復可能エラーを定義します。
//! 致命的クラス（アリーナ枯渇、非単調な型変更、派生領域ゼロでの範囲取得）は
//! ブート時レイアウト定義の欠陥であり、Result ではなく assert で停止します。

use core::fmt;

/// 領域レイアウト操作の回復可能エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// 指定アドレスを含む領域が存在しない
    RegionNotFound,
    /// 領域は見つかったが、要求範囲全体を包含していない
    RangeNotCovered,
    /// 包含領域の属性が期待値と一致しない
    AttributeMismatch,
    /// 包含領域の型から要求型へ派生できない（ビット部分集合でない）
    InvalidDerivation,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionNotFound => write!(f, "no region covers the requested address"),
            Self::RangeNotCovered => write!(f, "covering region does not span the requested range"),
            Self::AttributeMismatch => write!(f, "covering region attributes do not match"),
            Self::InvalidDerivation => {
                write!(f, "requested type does not refine the covering region")
            }
        }
    }
}

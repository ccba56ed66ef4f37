// ============================================================================
// src/global.rs - Global Memory Layout State
// ============================================================================
//!
//! プロセス全域メモリレイアウトのグローバルインスタンス管理
//!
//! コア型（アリーナ・木・レイアウト)は明示的なオブジェクトとして単体
//! テスト可能なまま、ブートストラップコードが使う共有インスタンスを
//! ここで提供する。初期化はプロセス開始時に一度だけ。

use spin::Mutex;

use crate::layout::MemoryLayout;

/// グローバルメモリレイアウト
static MEMORY_LAYOUT: Mutex<Option<MemoryLayout>> = Mutex::new(None);

/// プロセス全域レイアウトを初期化
///
/// 二重初期化は無視される（最初のレイアウトが生き続ける）。
pub fn init(rng_seed: u64) {
    let mut guard = MEMORY_LAYOUT.lock();
    if guard.is_some() {
        log::warn!("layout: global memory layout already initialized");
        return;
    }

    *guard = Some(MemoryLayout::new(rng_seed));
    log::info!("layout: global memory layout initialized");
}

/// 初期化済みかどうか
pub fn is_initialized() -> bool {
    MEMORY_LAYOUT.lock().is_some()
}

/// グローバルレイアウトへアクセス
///
/// 未初期化での呼び出しはブート順序の欠陥として停止する。
pub fn with_layout<R>(f: impl FnOnce(&mut MemoryLayout) -> R) -> R {
    let mut guard = MEMORY_LAYOUT.lock();
    let layout = guard.as_mut().expect("memory layout must be initialized");
    f(layout)
}

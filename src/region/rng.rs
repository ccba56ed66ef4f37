// ============================================================================
// src/region/rng.rs - レイアウト乱数源
// ============================================================================

/// ランダム配置用の決定的乱数源（シード指定可能な線形合同法）
///
/// ブート時のカーネル内部構造のアドレスランダム化に使う。再現可能な
/// シードを渡せるため、レイアウト構築はテストで決定的に追試できる。
#[derive(Debug, Clone)]
pub struct LayoutRng {
    state: u64,
}

impl LayoutRng {
    /// シードから乱数源を作成
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// 次の64bit乱数
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// `[low, high]` の一様乱数（両端含む）
    pub fn next_range(&mut self, low: u64, high: u64) -> u64 {
        debug_assert!(low <= high);
        let span = high.wrapping_sub(low).wrapping_add(1);
        if span == 0 {
            // 全域指定
            self.next_u64()
        } else {
            low + self.next_u64() % span
        }
    }
}

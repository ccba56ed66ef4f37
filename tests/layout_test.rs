// ============================================================================
// tests/layout_test.rs - レイアウト構築の統合テスト
// ============================================================================
//
// ブートストラップ列を模して型付きメモリマップを構築し、分類クエリと
// ランダム配置が公開APIだけで期待どおり応答することを検証する。

use kspace::{AddressSpaceKind, MemoryLayout, RegionAttributes, RegionType};

const DRAM_BASE: u64 = 0x8000_0000;
const DRAM_LAST: u64 = 0xFFFF_FFFF;
const MMIO_BASE: u64 = 0x4000_0000;
const MMIO_LAST: u64 = 0x4FFF_FFFF;
const KERNEL_VBASE: u64 = 0xFFFF_FF00_0000_0000;
const KERNEL_VSIZE: u64 = 0x0800_0000;

/// 物理側のブートストラップ列
fn build_physical(layout: &mut MemoryLayout) {
    let kind = AddressSpaceKind::Physical;
    let none = RegionAttributes::empty();

    // 最上位スライス
    layout.insert_directly(kind, DRAM_BASE, DRAM_LAST, none, RegionType::DRAM);
    layout.insert_directly(
        kind,
        MMIO_BASE,
        MMIO_LAST,
        RegionAttributes::DEVICE | RegionAttributes::UNCACHED,
        RegionType::IO,
    );

    // カーネル占有分を段階的に細分化
    layout
        .insert(kind, DRAM_BASE, 0x0800_0000, RegionType::KERNEL, none, none)
        .unwrap();
    layout
        .insert(kind, DRAM_BASE, 0x0100_0000, RegionType::KERNEL_CODE, none, none)
        .unwrap();
    layout
        .insert(kind, 0x8100_0000, 0x0200_0000, RegionType::KERNEL_POOL, none, none)
        .unwrap();

    // アプリケーション/システム予約
    layout
        .insert(kind, 0x8800_0000, 0x4000_0000, RegionType::APPLICATION, none, none)
        .unwrap();
    layout
        .insert(kind, 0xC800_0000, 0x0800_0000, RegionType::SYSTEM, none, none)
        .unwrap();
}

fn build_layout() -> MemoryLayout {
    let mut layout = MemoryLayout::new(0x5EED);
    build_physical(&mut layout);
    layout.insert_directly(
        AddressSpaceKind::Virtual,
        KERNEL_VBASE,
        KERNEL_VBASE + KERNEL_VSIZE - 1,
        RegionAttributes::empty(),
        RegionType::KERNEL,
    );
    layout
}

#[test]
fn test_bootstrap_classification() {
    let layout = build_layout();
    let kind = AddressSpaceKind::Physical;

    // 「アドレスXはどんなメモリか」への応答
    let code = layout.find(kind, DRAM_BASE + 0x1000).unwrap();
    assert_eq!(code.type_id(), RegionType::KERNEL_CODE);
    assert!(code.is_derived_from(RegionType::KERNEL));
    assert!(code.is_derived_from(RegionType::DRAM));

    let pool = layout.find(kind, 0x8200_0000).unwrap();
    assert_eq!(pool.type_id(), RegionType::KERNEL_POOL);

    let app = layout.find(kind, 0x9000_0000).unwrap();
    assert_eq!(app.type_id(), RegionType::APPLICATION);
    assert!(!app.is_derived_from(RegionType::KERNEL));

    let mmio = layout.find(kind, 0x4800_0000).unwrap();
    assert!(mmio.is_derived_from(RegionType::IO));

    // マップ外は未分類
    assert!(layout.find(kind, 0x1000).is_none());
    assert!(layout.find(kind, 0x5000_0000).is_none());

    // 属性は完全一致キー
    assert!(
        layout
            .find_by_type_and_attribute(
                kind,
                RegionType::IO,
                RegionAttributes::DEVICE | RegionAttributes::UNCACHED
            )
            .is_some()
    );
    assert!(
        layout
            .find_by_type_and_attribute(kind, RegionType::IO, RegionAttributes::DEVICE)
            .is_none()
    );
}

#[test]
fn test_category_extents_bound_footprint() {
    let layout = build_layout();
    let kind = AddressSpaceKind::Physical;

    // カーネル派生領域の足跡
    let extents = layout.derived_region_extents(kind, RegionType::KERNEL);
    assert_eq!(extents.address(), DRAM_BASE);
    assert_eq!(extents.last_address(), DRAM_BASE + 0x0800_0000 - 1);

    assert_eq!(
        layout.find_first_derived(kind, RegionType::KERNEL).unwrap().type_id(),
        RegionType::KERNEL_CODE
    );
    assert_eq!(
        layout.find_last_derived(kind, RegionType::KERNEL).unwrap().type_id(),
        RegionType::KERNEL
    );

    // DRAM派生はDRAM全域を張る
    let dram = layout.derived_region_extents(kind, RegionType::DRAM);
    assert_eq!(dram.address(), DRAM_BASE);
    assert_eq!(dram.last_address(), DRAM_LAST);
}

#[test]
fn test_node_budget_is_shared_and_bounded() {
    let layout = build_layout();

    // 物理: 直接2 + 刻み込み5回（各1片追加、スロット再利用）、仮想: 直接1
    assert_eq!(layout.arena().len(), 8);
    assert_eq!(
        layout.remaining_regions(),
        kspace::MAX_MEMORY_REGIONS - 8
    );
}

#[test]
fn test_randomized_kernel_stack_placement() {
    let mut layout = build_layout();
    let kind = AddressSpaceKind::Virtual;
    let none = RegionAttributes::empty();

    let stack_size = 0x4000u64;
    let guard = 0x1000u64;
    let address = layout.random_aligned_region_with_guard(
        kind,
        stack_size,
        0x1000,
        RegionType::KERNEL,
        guard,
    );

    // ガード帯込みでカーネルスライスに収まる
    assert_eq!(address % 0x1000, 0);
    assert!(address - guard >= KERNEL_VBASE);
    assert!(address + stack_size + guard - 1 <= KERNEL_VBASE + KERNEL_VSIZE - 1);

    // 選ばれた窓を実際に刻み込んで分類へ反映
    layout
        .insert(kind, address, stack_size, RegionType::KERNEL_STACK, none, none)
        .unwrap();
    let stack = layout.find(kind, address).unwrap();
    assert_eq!(stack.type_id(), RegionType::KERNEL_STACK);
    assert_eq!(stack.size(), stack_size);

    // ガード帯は未分類ではなく元のカーネルスライスに残る
    let below = layout.find(kind, address - 1).unwrap();
    assert_eq!(below.type_id(), RegionType::KERNEL);
}

#[test]
fn test_global_layout_instance() {
    assert!(!kspace::global::is_initialized());

    kspace::global::init(0xB007);
    assert!(kspace::global::is_initialized());

    // 二重初期化は最初のインスタンスを保つ
    kspace::global::init(0xFFFF);

    kspace::global::with_layout(|layout| {
        build_physical(layout);
        assert!(layout.find(AddressSpaceKind::Physical, DRAM_BASE).is_some());
    });
    kspace::global::with_layout(|layout| {
        // 前回の構築が残っている
        assert_eq!(
            layout.find(AddressSpaceKind::Physical, DRAM_BASE).unwrap().type_id(),
            RegionType::KERNEL_CODE
        );
    });
}

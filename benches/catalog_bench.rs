//! Catalog filter and atlas resolve benchmarks.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rust_ccg_sync::atlas::{AtlasSet, AtlasSliceCache, RgbaSurface, UvRect, UvSlice, UvTable};
use rust_ccg_sync::cards::{CardId, CardQuery, CardRecord, CatalogIndex, Rarity};
use rust_ccg_sync::core::{CacheConfig, MonotonicClock};

const CARDS: usize = 20_000;

fn catalog() -> CatalogIndex {
    let rarities = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Mythic];
    CatalogIndex::from_records((0..CARDS).map(|i| {
        let kind = if i % 3 == 0 { "Creature — Elf" } else { "Instant" };
        let record = CardRecord::new(format!("id{i}"), format!("Card {i}"), kind, format!("{{{}}}{{G}}", i % 7))
            .with_rarity(rarities[i % rarities.len()]);
        if i % 2 == 0 {
            record.legal_in("modern")
        } else {
            record
        }
    }))
}

fn bench_filter(c: &mut Criterion) {
    let catalog = catalog();
    let query = CardQuery::new()
        .rarity(Rarity::Rare)
        .type_contains("elf")
        .legal_in("modern")
        .converted_cost(3);

    c.bench_function("catalog_filter", |b| {
        b.iter(|| black_box(catalog.filter(&query).count()))
    });

    c.bench_function("catalog_by_name", |b| {
        b.iter(|| black_box(catalog.by_name("card 12345")))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let slices = (0..1024u32).map(|i| UvSlice {
        card_id: CardId::new(format!("id{i}")),
        atlas_index: 0,
        rect: UvRect {
            x: (i % 32) as f32 / 32.0,
            y: (i / 32) as f32 / 32.0,
            width: 1.0 / 32.0,
            height: 1.0 / 32.0,
        },
    });
    let cache = AtlasSliceCache::new(
        &CacheConfig::new(256, Duration::from_secs(300)),
        UvTable::from_slices(slices),
        AtlasSet::new().with_surface(RgbaSurface::filled(1024, 1024, [0, 0, 0, 255])),
        Arc::new(MonotonicClock),
    );
    let ids: Vec<_> = (0..1024).map(|i| CardId::new(format!("id{i}"))).collect();

    c.bench_function("atlas_resolve_hit", |b| {
        cache.resolve(&ids[0]);
        b.iter(|| black_box(cache.resolve(&ids[0]).is_hit()))
    });

    c.bench_function("atlas_resolve_churn", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % ids.len();
            black_box(cache.resolve(&ids[i]).is_hit())
        })
    });
}

criterion_group!(benches, bench_filter, bench_resolve);
criterion_main!(benches);

// Criterion benchmarks for Swipestore's pure paths

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use swipestore::models::{page_window, PageResult, PageSize};
use swipestore::{PageRequest, Post};
use uuid::Uuid;

fn bench_page_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_window");

    for total in [0_u64, 100, 10_000, 1_000_000].iter() {
        group.bench_with_input(BenchmarkId::new("limit_25", total), total, |b, &total| {
            b.iter(|| page_window(black_box(total), black_box(7), PageSize::Limit(25)));
        });
    }

    group.finish();
}

fn bench_page_request_construction(c: &mut Criterion) {
    c.bench_function("page_request_with_search_and_filters", |b| {
        b.iter(|| {
            PageRequest::new()
                .page(black_box(3))
                .page_size(PageSize::Limit(20))
                .search(black_box("lima"), &["city", "name", "about"])
                .filter("city", black_box("Lima"))
                .filter_absent("about")
        });
    });
}

fn bench_page_result_serialization(c: &mut Criterion) {
    let values: Vec<Post> = (0..100)
        .map(|i| Post {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            content: format!("post number {i}"),
            created_at: chrono::Utc::now(),
        })
        .collect();
    let page = PageResult {
        values,
        total: 100,
        page: 1,
        pages: 5,
        page_size: PageSize::Limit(20),
    };

    c.bench_function("serialize_page_of_100_posts", |b| {
        b.iter(|| serde_json::to_string(black_box(&page)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_page_window,
    bench_page_request_construction,
    bench_page_result_serialization
);

criterion_main!(benches);

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dom::{Document, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(count: usize) -> String {
    let mut out = String::with_capacity(count * 64);
    for i in 0..count {
        out.push_str(&format!(
            "<div class=box id=b{i}><span sp-keep>hello</span><img src=x></div>"
        ));
    }
    out
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

fn bench_parse_fragment_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_fragment_large", |b| {
        b.iter(|| {
            let mut doc = Document::new();
            let fragment = doc.parse_fragment(black_box(&input));
            black_box(doc.children(fragment).len());
        });
    });
}

fn bench_clone_subtree_large(c: &mut Criterion) {
    let mut doc = Document::new();
    let fragment = doc.parse_fragment(&make_blocks(LARGE_BLOCKS));
    let body = doc.body().expect("document has a body");
    let holder = doc.create_element("main");
    doc.append_child(body, holder).expect("main attaches to body");
    let children = doc.children(fragment).to_vec();
    for child in children {
        doc.append_child(holder, child).expect("block attaches to main");
    }
    c.bench_function("bench_clone_subtree_large", |b| {
        b.iter(|| black_box(doc.clone_subtree(black_box(holder))));
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_parse_fragment_large,
    bench_clone_subtree_large
);
criterion_main!(benches);

// Path parsing and resolution benchmarks
// Run with: cargo bench --bench path

use courier_data::{DataObject, DataPath, path};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const GUILD: &str = r#"{
    "id": "197038439483310086",
    "name": "courier",
    "owner": {"id": "81384788765712384", "username": "owner"},
    "roles": [
        {"id": "1", "name": "@everyone", "permissions": "104324673"},
        {"id": "2", "name": "mod", "permissions": "2147483647", "tags": {"bot_id": "3"}}
    ],
    "features": ["COMMUNITY", "NEWS"]
}"#;

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("path/parse");

    for text in ["name", "owner.username", "roles[1].tags?.bot_id", "roles[0]?.name?"] {
        group.bench_with_input(BenchmarkId::from_parameter(text), text, |b, text| {
            b.iter(|| DataPath::parse(black_box(text)));
        });
    }

    group.finish();
}

fn benchmark_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("path/resolve");
    let root = DataObject::from_json_str(GUILD).expect("valid fixture");

    let parsed = DataPath::parse("roles[1].tags.bot_id").expect("valid path");
    group.bench_function("parsed_once", |b| {
        b.iter(|| parsed.get_unsigned_long(black_box(&root)));
    });

    group.bench_function("one_shot", |b| {
        b.iter(|| path::get_unsigned_long(black_box(&root), black_box("roles[1].tags.bot_id")));
    });

    group.bench_function("optional_absent", |b| {
        b.iter(|| path::get_string_or(black_box(&root), black_box("roles[0].tags?.bot_id"), "none"));
    });

    group.bench_function("manual_walk", |b| {
        b.iter(|| {
            black_box(&root)
                .get_array("roles")
                .and_then(|roles| roles.get_object(1))
                .and_then(|role| role.get_object("tags"))
                .and_then(|tags| tags.get_unsigned_long("bot_id"))
        });
    });

    group.finish();
}

fn benchmark_parse_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");
    let root = DataObject::from_json_str(GUILD).expect("valid fixture");
    let binary = root.to_binary().expect("encodable");

    group.bench_function("json", |b| {
        b.iter(|| DataObject::from_json_str(black_box(GUILD)));
    });
    group.bench_function("binary", |b| {
        b.iter(|| DataObject::from_binary(black_box(&binary)));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_resolve,
    benchmark_parse_payload
);
criterion_main!(benches);

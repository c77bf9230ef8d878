/// Hot-path benchmarks for the per-request pure functions
///
/// Run with: cargo bench --bench query_guard
///
/// Benchmarks cover:
/// - SQL safety gate over safe and rejected statements of growing size
/// - Extraction of SQL from model output
/// - Classifier label resolution
/// - Response cache key derivation
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use erp_copilot::domain::models::{AgentLabel, QueryRequest};
use erp_copilot::services::intent_classifier::resolve_label;
use erp_copilot::services::query_guard::check;
use erp_copilot::services::result_cache::cache_key;
use erp_copilot::services::sql_agent::extract_sql;

fn select_with_columns(columns: usize) -> String {
    let projection = (0..columns)
        .map(|i| format!("o.Colonna{i}"))
        .collect::<Vec<_>>()
        .join(",\n       ");
    format!("SELECT {projection}\nFROM Ordini o\nWHERE o.TenantId = 'acme' AND MONTH(o.Data) = 3;")
}

fn bench_query_guard(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_guard_check");

    for columns in &[4usize, 64, 512] {
        let safe = select_with_columns(*columns);
        let rejected = format!("{safe}\nDROP TABLE Ordini;");
        group.throughput(Throughput::Bytes(safe.len() as u64));

        group.bench_with_input(BenchmarkId::new("safe", columns), &safe, |b, sql| {
            b.iter(|| check(black_box(sql)));
        });
        group.bench_with_input(BenchmarkId::new("rejected", columns), &rejected, |b, sql| {
            b.iter(|| check(black_box(sql)));
        });
    }

    group.finish();
}

fn bench_extract_sql(c: &mut Criterion) {
    let json_reply = r#"{"sql": "SELECT SUM(Totale) FROM Vendite WHERE MONTH(Data) = 3", "explanation": "Totale vendite di marzo"}"#;
    let fenced_reply = "Ecco la query:\n```sql\nSELECT SUM(Totale) FROM Vendite WHERE MONTH(Data) = 3\n```\nSomma delle vendite.";

    c.bench_function("extract_sql_json", |b| b.iter(|| extract_sql(black_box(json_reply))));
    c.bench_function("extract_sql_fenced", |b| b.iter(|| extract_sql(black_box(fenced_reply))));
}

fn bench_resolve_label(c: &mut Criterion) {
    c.bench_function("resolve_label_json", |b| {
        b.iter(|| resolve_label(black_box(r#"{"agent": "rag"}"#)));
    });
    c.bench_function("resolve_label_fallback", |b| {
        b.iter(|| resolve_label(black_box("I think this belongs to the ERP agent.")));
    });
}

fn bench_cache_key(c: &mut Criterion) {
    let request = QueryRequest::new("  Quante   vendite abbiamo fatto a MARZO?  ", "acme").with_module("sales");
    c.bench_function("cache_key", |b| {
        b.iter(|| cache_key(black_box(AgentLabel::Rag), black_box(&request)));
    });
}

criterion_group!(
    benches,
    bench_query_guard,
    bench_extract_sql,
    bench_resolve_label,
    bench_cache_key
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tradewh_core::{SqlRow, SqlValue};
use tradewh_trade::{
    build_aggregate_query, validate, AggregateRequestBody, AggregateResult,
};

fn body(group_by: &[&str], with_filters: bool) -> AggregateRequestBody {
    let mut body = AggregateRequestBody::default();
    body.date_range.start_year = Some(2015);
    body.date_range.end_year = Some(2023);
    body.group_by = Some(group_by.iter().map(|g| g.to_string()).collect());
    if with_filters {
        body.trade_types = Some(vec!["Import".into(), "Export".into()]);
        body.filters.product_ids = Some((1..=50).collect());
        body.filters.port_ids = Some(vec![3, 7, 11]);
        body.filters.port_types = Some(vec!["Sea".into()]);
    }
    body
}

fn bench_validate_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_and_build");

    let cases: [(&str, &[&str], bool); 3] = [
        ("year", &["year"], false),
        ("product_port_year", &["product", "port", "year"], false),
        ("product_port_filtered", &["product", "port", "year", "trade_type"], true),
    ];

    for (name, group_by, with_filters) in cases {
        let input = body(group_by, with_filters);
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| {
                let req = validate(black_box(input.clone())).unwrap();
                black_box(build_aggregate_query(&req).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize_rows");

    let req = validate(body(&["product", "port", "year", "trade_type"], false)).unwrap();
    let query = build_aggregate_query(&req).unwrap();
    let columns = query.columns().to_vec();

    for row_count in [25usize, 1000].iter() {
        let rows: Vec<SqlRow> = (0..*row_count)
            .map(|i| {
                SqlRow::new(vec![
                    SqlValue::Int(i as i64),
                    SqlValue::from(format!("product {i}")),
                    SqlValue::Null,
                    SqlValue::Int(4),
                    SqlValue::from("Jebel Ali"),
                    SqlValue::Null,
                    SqlValue::Int(2020),
                    SqlValue::from("Import"),
                    SqlValue::Int(i as i64 * 1_000),
                ])
            })
            .collect();

        group.throughput(Throughput::Elements(*row_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(row_count), &rows, |b, rows| {
            b.iter(|| {
                rows.iter()
                    .map(|row| AggregateResult::from_row(&columns, row).unwrap())
                    .collect::<Vec<_>>()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate_and_build, bench_materialize);
criterion_main!(benches);

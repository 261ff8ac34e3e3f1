//! Query builder tests

use crate::query_builder::{QueryBuilder, QueryFilter, QueryOperator, SortOrder, SqlGenerator};
use serde_json::{json, Value};

fn people() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Ada", "age": 36, "team": "core", "tags": ["a", "b"]}),
        json!({"id": 2, "name": "Brian", "age": 25, "team": "web", "tags": ["c"]}),
        json!({"id": 3, "name": "Cleo", "age": 41, "team": "core", "tags": []}),
        json!({"id": 4, "name": "Dan", "age": 25, "team": null}),
        json!({"id": 5, "name": "Eve", "age": 30, "team": "web", "tags": ["b"]}),
    ]
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().filter_map(|row| row["id"].as_i64()).collect()
}

// ========================================
// In-memory evaluation
// ========================================

#[test]
fn test_filter_then_take_differs_from_take_then_filter() {
    let core = QueryFilter::eq("team", json!("core"));

    let filter_first = QueryBuilder::new().filter(core.clone()).take(1);
    let take_first = QueryBuilder::new().take(1).filter(core.clone()).take(1);

    assert_eq!(ids(&filter_first.apply(people())), vec![1]);
    assert_eq!(ids(&QueryBuilder::new().take(2).filter(core).apply(people())), vec![1]);
    assert_eq!(ids(&take_first.apply(people())), vec![1]);
}

#[test]
fn test_skip_and_take_are_order_sensitive() {
    let skip_take = QueryBuilder::new().skip(1).take(2);
    let take_skip = QueryBuilder::new().take(2).skip(1);

    assert_eq!(ids(&skip_take.apply(people())), vec![2, 3]);
    assert_eq!(ids(&take_skip.apply(people())), vec![2]);
}

#[test]
fn test_order_by_replaces_and_then_by_refines() {
    let query = QueryBuilder::new()
        .order_by("name", SortOrder::Desc)
        .order_by("age", SortOrder::Asc)
        .then_by("name", SortOrder::Desc);

    assert_eq!(ids(&query.apply(people())), vec![4, 2, 5, 1, 3]);
}

#[test]
fn test_then_by_on_unordered_query_orders() {
    let query = QueryBuilder::new().then_by("age", SortOrder::Desc);
    assert!(query.is_ordered());
    assert_eq!(ids(&query.apply(people()))[0], 3);
}

#[test]
fn test_null_handling() {
    let missing_team = QueryBuilder::new().filter(QueryFilter::is_null("team"));
    assert_eq!(ids(&missing_team.apply(people())), vec![4]);

    let eq_null = QueryBuilder::new().filter(QueryFilter::eq("team", Value::Null));
    assert_eq!(ids(&eq_null.apply(people())), vec![4]);

    // Null never satisfies a comparison
    let not_web = QueryBuilder::new().filter(QueryFilter::ne("team", json!("web")));
    assert_eq!(ids(&not_web.apply(people())), vec![1, 3]);

    let sorted = QueryBuilder::new().order_by("team", SortOrder::Asc);
    assert_eq!(ids(&sorted.apply(people()))[0], 4);
}

#[test]
fn test_operators() {
    let cases: Vec<(QueryFilter, Vec<i64>)> = vec![
        (QueryFilter::gt("age", json!(30)), vec![1, 3]),
        (QueryFilter::gte("age", json!(30)), vec![1, 3, 5]),
        (QueryFilter::lt("age", json!(30)), vec![2, 4]),
        (QueryFilter::lte("age", json!(25.0)), vec![2, 4]),
        (QueryFilter::like("name", "A%"), vec![1]),
        (QueryFilter::like("name", "a%"), vec![]),
        (QueryFilter::ilike("name", "%AN"), vec![2, 4]),
        (QueryFilter::in_values("id", vec![json!(2), json!(5)]), vec![2, 5]),
        (QueryFilter::not_in_values("team", vec![json!("core")]), vec![2, 5]),
        (QueryFilter::in_values("id", vec![]), vec![]),
        (QueryFilter::overlaps("tags", vec![json!("b")]), vec![1, 5]),
        (QueryFilter::eq("missing.field", json!(1)), vec![]),
        (
            QueryFilter::or(vec![
                QueryFilter::eq("name", json!("Ada")),
                QueryFilter::eq("name", json!("Eve")),
            ]),
            vec![1, 5],
        ),
        (
            QueryFilter::negate(QueryFilter::eq("team", json!("core"))),
            vec![2, 4, 5],
        ),
        (QueryFilter::always(), vec![1, 2, 3, 4, 5]),
        (QueryFilter::never(), vec![]),
    ];

    for (filter, expected) in cases {
        let rows = QueryBuilder::new().filter(filter.clone()).apply(people());
        assert_eq!(ids(&rows), expected, "filter {:?}", filter);
    }
}

#[test]
fn test_select_projects_fields() {
    let rows = QueryBuilder::new()
        .filter(QueryFilter::eq("id", json!(2)))
        .select(vec!["name".to_string(), "unknown".to_string()])
        .apply(people());

    assert_eq!(rows, vec![json!({"name": "Brian"})]);
}

#[test]
fn test_count_ignores_projection() {
    let query = QueryBuilder::new()
        .filter(QueryFilter::eq("team", json!("web")))
        .select(vec!["id".to_string()]);
    assert_eq!(query.count(people()), 2);
}

#[test]
fn test_nested_field_paths() {
    let rows = vec![
        json!({"id": 1, "address": {"city": "Oslo"}}),
        json!({"id": 2, "address": {"city": "Rome"}}),
    ];
    let query = QueryBuilder::new().filter(QueryFilter::eq("address.city", json!("Rome")));
    assert_eq!(ids(&query.apply(rows)), vec![2]);
}

// ========================================
// SQL generation
// ========================================

#[test]
fn test_sql_generation_empty_conditions() {
    let (where_clause, values) = SqlGenerator::build_where_clause(&[]);
    assert_eq!(where_clause, "");
    assert!(values.is_empty());
}

#[test]
fn test_sql_generation_empty_arrays() {
    let filter = QueryFilter::in_values("status", vec![]);
    let (where_clause, values) = SqlGenerator::build_where_clause(&[filter]);
    assert_eq!(where_clause, "WHERE 1=0");
    assert!(values.is_empty());

    let filter = QueryFilter::not_in_values("kind", vec![]);
    let (where_clause, _) = SqlGenerator::build_where_clause(&[filter]);
    assert_eq!(where_clause, "WHERE 1=1");
}

#[test]
fn test_sql_generation_null_values() {
    let (where_clause, values) =
        SqlGenerator::build_where_clause(&[QueryFilter::eq("deleted_at", Value::Null)]);
    assert_eq!(where_clause, "WHERE deleted_at IS NULL");
    assert!(values.is_empty());

    let filter = QueryFilter::condition("amount", QueryOperator::Gt, None);
    let (where_clause, _) = SqlGenerator::build_where_clause(&[filter]);
    assert_eq!(where_clause, "WHERE 1=0");
}

#[test]
fn test_sql_generation_groups_and_negation() {
    let filter = QueryFilter::and(vec![
        QueryFilter::or(vec![
            QueryFilter::eq("status", json!("active")),
            QueryFilter::eq("status", json!("pending")),
        ]),
        QueryFilter::negate(QueryFilter::in_values("id", vec![json!(1), json!(2)])),
    ]);

    let (where_clause, values) = SqlGenerator::build_where_clause(&[filter]);
    assert_eq!(
        where_clause,
        "WHERE ((status = $1 OR status = $2) AND NOT (id IN ($3, $4)))"
    );
    assert_eq!(values.len(), 4);
}

#[test]
fn test_build_select_single_level() {
    let query = QueryBuilder::new()
        .filter(QueryFilter::eq("team", json!("core")))
        .filter(QueryFilter::gt("age", json!(30)))
        .order_by("name", SortOrder::Asc)
        .then_by("id", SortOrder::Desc)
        .skip(10)
        .take(5);

    let (sql, values) = query.build_select("people");
    assert_eq!(
        sql,
        "SELECT * FROM people WHERE team = $1 AND age > $2 ORDER BY name ASC, id DESC LIMIT 5 OFFSET 10"
    );
    assert_eq!(values, vec![json!("core"), json!(30)]);
}

#[test]
fn test_build_select_wraps_when_filtering_after_take() {
    let query = QueryBuilder::new()
        .order_by("age", SortOrder::Desc)
        .take(3)
        .filter(QueryFilter::eq("team", json!("web")))
        .select(vec!["id".to_string(), "name".to_string()]);

    let (sql, values) = query.build_select("people");
    assert_eq!(
        sql,
        "SELECT id, name FROM (SELECT * FROM people ORDER BY age DESC LIMIT 3) AS s1 WHERE team = $1 ORDER BY age DESC"
    );
    assert_eq!(values.len(), 1);
}

#[test]
fn test_build_select_skip_after_take_wraps() {
    let (sql, _) = QueryBuilder::new().take(2).skip(1).build_select("people");
    assert_eq!(
        sql,
        "SELECT * FROM (SELECT * FROM people LIMIT 2) AS s1 OFFSET 1"
    );
}

#[test]
fn test_build_count_numbers_params_across_levels() {
    let query = QueryBuilder::new()
        .filter(QueryFilter::eq("a", json!(1)))
        .take(10)
        .filter(QueryFilter::eq("b", json!(2)));

    let (sql, values) = query.build_count("t");
    assert_eq!(
        sql,
        "SELECT COUNT(*) AS total FROM (SELECT * FROM (SELECT * FROM t WHERE a = $1 LIMIT 10) AS s1 WHERE b = $2) AS c"
    );
    assert_eq!(values, vec![json!(1), json!(2)]);
}

#[test]
fn test_referenced_fields() {
    let query = QueryBuilder::new()
        .filter(QueryFilter::and(vec![
            QueryFilter::eq("a", json!(1)),
            QueryFilter::is_null("b"),
        ]))
        .order_by("c", SortOrder::Asc)
        .select(vec!["d".to_string()]);

    assert_eq!(query.referenced_fields(), vec!["a", "b", "c", "d"]);
}

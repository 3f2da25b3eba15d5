//! Unit tests for the SqlBuilder query construction.

use gas_cash::SqlBuilder;

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("observations").build();
    assert_eq!(sql, "SELECT *\nFROM observations");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("observations")
        .select(&["trade_date", "symbol"])
        .build();
    assert!(sql.starts_with("SELECT trade_date, symbol\n"));
}

#[test]
fn from_subquery_wraps_and_aliases() {
    let (sql, _) = SqlBuilder::from_subquery("SELECT 1 AS x", "s").build();
    assert_eq!(sql, "SELECT *\nFROM (SELECT 1 AS x) s");
}

// ---------------------------------------------------------------------------
// SELECT expressions with parameters
// ---------------------------------------------------------------------------

#[test]
fn select_expr_replaces_star_on_first_call() {
    let (sql, params) = SqlBuilder::new("observations")
        .select_expr("trade_date", &[])
        .select_expr("AVG(CASE WHEN symbol = ? THEN value END) AS hh_cash", &["XGF D1-IPG"])
        .build();
    assert!(sql.starts_with(
        "SELECT trade_date, AVG(CASE WHEN symbol = ? THEN value END) AS hh_cash\n"
    ));
    assert_eq!(params, vec!["XGF D1-IPG"]);
}

#[test]
fn select_params_precede_where_params() {
    let (_, params) = SqlBuilder::new("observations")
        .where_eq("symbol", "XGF D1-IPG")
        .select_expr("AVG(CASE WHEN symbol = ? THEN value END) AS waha_cash", &["XT6 D1-IPG"])
        .build();
    assert_eq!(params, vec!["XT6 D1-IPG", "XGF D1-IPG"]);
}

// ---------------------------------------------------------------------------
// WITH
// ---------------------------------------------------------------------------

#[test]
fn with_prepends_cte_and_its_params() {
    let (sql, params) = SqlBuilder::new("daily")
        .with(
            "daily",
            "SELECT * FROM observations WHERE symbol = ?",
            &["XGF D1-IPG".to_string()],
        )
        .select_expr("AVG(value) FILTER (WHERE symbol = ?) AS v", &["XT6 D1-IPG"])
        .where_date_gte("trade_date", "2025-01-01")
        .build();
    assert!(sql.starts_with("WITH daily AS (\nSELECT * FROM observations WHERE symbol = ?\n)\nSELECT "));
    assert_eq!(params, vec!["XGF D1-IPG", "XT6 D1-IPG", "2025-01-01"]);
}

#[test]
fn multiple_ctes_are_comma_separated() {
    let (sql, _) = SqlBuilder::new("b")
        .with("a", "SELECT 1 AS x", &[])
        .with("b", "SELECT x FROM a", &[])
        .build();
    assert!(sql.starts_with("WITH a AS (\nSELECT 1 AS x\n),\nb AS (\nSELECT x FROM a\n)"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new("observations")
        .where_eq("symbol", "XGF D1-IPG")
        .build();
    assert!(sql.contains("WHERE symbol = ?"));
    assert_eq!(params, vec!["XGF D1-IPG"]);
}

#[test]
fn where_not_in_adds_clause() {
    let (sql, params) = SqlBuilder::new("observations")
        .where_not_in("symbol", &["a", "b"])
        .build();
    assert!(sql.contains("symbol NOT IN (?, ?)"));
    assert_eq!(params, vec!["a", "b"]);
}

#[test]
fn where_not_in_empty_is_noop() {
    let (sql, params) = SqlBuilder::new("observations")
        .where_not_in("symbol", &[])
        .build();
    assert!(!sql.contains("WHERE"));
    assert!(params.is_empty());
}

#[test]
fn date_bounds_cast_their_params() {
    let (sql, params) = SqlBuilder::new("observations")
        .where_date_gte("trade_date", "2025-01-01")
        .where_date_lte("trade_date", "2025-03-31")
        .build();
    assert!(sql.contains(
        "WHERE trade_date >= CAST(? AS DATE) AND trade_date <= CAST(? AS DATE)"
    ));
    assert_eq!(params, vec!["2025-01-01", "2025-03-31"]);
}

#[test]
fn where_clause_appends_params_in_order() {
    let (sql, params) = SqlBuilder::new("observations")
        .where_eq("symbol", "XGF D1-IPG")
        .where_clause("value > ?", &["2.5"])
        .build();
    assert!(sql.contains("symbol = ?"));
    assert!(sql.contains("value > ?"));
    assert_eq!(params, vec!["XGF D1-IPG", "2.5"]);
}

// ---------------------------------------------------------------------------
// DISTINCT
// ---------------------------------------------------------------------------

#[test]
fn distinct_adds_keyword() {
    let (sql, _) = SqlBuilder::new("observations").distinct().build();
    assert!(sql.starts_with("SELECT DISTINCT *"));
}

// ---------------------------------------------------------------------------
// GROUP BY / HAVING
// ---------------------------------------------------------------------------

#[test]
fn group_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("observations")
        .select(&["symbol", "COUNT(*) AS cnt"])
        .group_by(&["symbol"])
        .build();
    assert!(sql.contains("GROUP BY symbol"));
}

#[test]
fn having_params_ordered_after_where_params() {
    let (sql, params) = SqlBuilder::new("observations")
        .select(&["symbol", "COUNT(*) AS cnt"])
        .having("COUNT(*) > ?", &["2"])
        .where_eq("trade_date", "2025-03-14")
        .group_by(&["symbol"])
        .build();
    assert!(sql.contains("HAVING COUNT(*) > ?"));
    assert_eq!(params, vec!["2025-03-14", "2"]);
}

// ---------------------------------------------------------------------------
// ORDER BY / LIMIT
// ---------------------------------------------------------------------------

#[test]
fn order_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("observations")
        .order_by(&["trade_date DESC", "symbol ASC"])
        .build();
    assert!(sql.contains("ORDER BY trade_date DESC, symbol ASC"));
}

#[test]
fn limit_is_last_clause() {
    let (sql, _) = SqlBuilder::new("observations")
        .order_by(&["trade_date DESC"])
        .limit(1)
        .build();
    assert!(sql.ends_with("ORDER BY trade_date DESC\nLIMIT 1"));
}

// ---------------------------------------------------------------------------
// Combined
// ---------------------------------------------------------------------------

#[test]
fn full_query_with_grouping() {
    let (sql, params) = SqlBuilder::new("observations")
        .select(&["symbol", "COUNT(*) AS cnt"])
        .where_date_gte("trade_date", "2025-01-01")
        .group_by(&["symbol"])
        .having("COUNT(*) >= ?", &["10"])
        .order_by(&["cnt DESC"])
        .limit(5)
        .build();

    assert_eq!(
        sql,
        "SELECT symbol, COUNT(*) AS cnt\n\
         FROM observations\n\
         WHERE trade_date >= CAST(? AS DATE)\n\
         GROUP BY symbol\n\
         HAVING COUNT(*) >= ?\n\
         ORDER BY cnt DESC\n\
         LIMIT 5"
    );
    assert_eq!(params, vec!["2025-01-01", "10"]);
}

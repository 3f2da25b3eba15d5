//! Raw observation query tests.

mod common;

use common::date;
use gas_cash::queries::ObservationQuery;
use gas_cash::SymbolMap;

#[test]
fn history_ascends_by_trade_date() {
    let (conn, _tmp) = common::setup_sample_db();

    let history = ObservationQuery::new(&conn)
        .history("XGF D1-IPG", None, None)
        .unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].trade_date, date("2024-12-31"));
    assert_eq!(history[0].value, 3.0);
    assert_eq!(history[4].trade_date, date("2025-03-15"));
    for pair in history.windows(2) {
        assert!(pair[0].trade_date <= pair[1].trade_date);
    }
    assert!(history.iter().all(|o| o.symbol == "XGF D1-IPG"));
}

#[test]
fn history_bounds_are_inclusive() {
    let (conn, _tmp) = common::setup_sample_db();

    let history = ObservationQuery::new(&conn)
        .history("XGF D1-IPG", Some(date("2025-02-28")), Some(date("2025-03-14")))
        .unwrap();
    let dates: Vec<_> = history.iter().map(|o| o.trade_date).collect();
    assert_eq!(dates, vec![date("2025-02-28"), date("2025-03-14")]);
}

#[test]
fn history_of_unknown_symbol_is_empty() {
    let (conn, _tmp) = common::setup_sample_db();

    let history = ObservationQuery::new(&conn)
        .history("YKL D1-IPG", None, None)
        .unwrap();
    assert!(history.is_empty());
}

#[test]
fn symbols_lists_every_distinct_symbol_with_counts() {
    let (conn, _tmp) = common::setup_sample_db();

    let symbols = ObservationQuery::new(&conn).symbols().unwrap();
    assert_eq!(symbols.len(), 10);
    assert_eq!(symbols[0].symbol, "X7F D1-IPG");
    let hh = symbols.iter().find(|s| s.symbol == "XGF D1-IPG").unwrap();
    assert_eq!(hh.observations, 5);
    for pair in symbols.windows(2) {
        assert!(pair[0].symbol < pair[1].symbol);
    }
}

#[test]
fn untracked_symbols_excludes_mapped_ones() {
    let (conn, _tmp) = common::setup_sample_db();
    let map = SymbolMap::default();

    let untracked = ObservationQuery::new(&conn)
        .untracked_symbols(&map)
        .unwrap();
    assert_eq!(untracked.len(), 1);
    assert_eq!(untracked[0].symbol, "ZZZ D1-IPG");
    assert_eq!(untracked[0].observations, 1);
}

#[test]
fn count_matches_source_rows() {
    let (conn, _tmp) = common::setup_sample_db();

    let count = ObservationQuery::new(&conn).count().unwrap();
    assert_eq!(count, 14);
}

#[test]
fn client_untracked_uses_its_own_map() {
    let (client, _tmp) = common::offline_client();
    common::write_ndjson_and_register(
        client.connection(),
        "observations",
        &common::sample_observations(),
    );

    let untracked = client.untracked_symbols().unwrap();
    let names: Vec<_> = untracked.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(names, vec!["ZZZ D1-IPG"]);
}

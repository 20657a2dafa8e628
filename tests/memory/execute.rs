use std::rc::Rc;

use dalc::{CommandKind, Dalc, Error, MemoryProvider, Param, Value, DEFAULT_OUTPUT_SIZE};

fn seeded_provider() -> Rc<MemoryProvider> {
    let provider = Rc::new(MemoryProvider::new());
    let dalc = Dalc::new(provider.clone());
    for name in ["ada", "grace", "edsger"] {
        dalc.execute_non_query("insert people", &mut [Param::new("name", name)])
            .unwrap();
    }
    provider
}

#[test]
fn scalar_returns_first_value_of_first_row() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider);

    let value = dalc.execute_scalar("select people", &mut []).unwrap();
    assert_eq!(value.as_text(), Some("ada"));

    let count = dalc.execute_scalar("count people", &mut []).unwrap();
    assert_eq!(count, Value::Integer(3));

    let none = dalc.execute_scalar("select empty", &mut []).unwrap();
    assert!(none.is_null());
}

#[test]
fn non_query_reports_rows_affected() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider);

    let inserted = dalc
        .execute_non_query("insert people", &mut [Param::new("name", "barbara")])
        .unwrap();
    assert_eq!(inserted, 1);

    let deleted = dalc.execute_non_query("delete people", &mut []).unwrap();
    assert_eq!(deleted, 4);

    let count = dalc.execute_scalar("count people", &mut []).unwrap();
    assert_eq!(count, Value::Integer(0));
}

#[test]
fn explicit_command_kind_is_accepted() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider);

    let count = dalc
        .execute_scalar_with("count people", CommandKind::StoredProcedure, &mut [])
        .unwrap();
    assert_eq!(count, Value::Integer(3));
}

#[test]
fn table_materializes_rows_and_releases_connection() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider.clone());

    let table = dalc
        .execute_table("select people", &mut [])
        .unwrap()
        .unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.columns().ordinal("name"), Some(0));

    let names: Vec<_> = table
        .iter()
        .map(|row| row.get("name").as_text().unwrap().to_owned())
        .collect();
    assert_eq!(names, ["ada", "grace", "edsger"]);

    assert_eq!(provider.open_connections(), 0);
}

#[test]
fn table_is_none_when_no_result_set_was_produced() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider);

    let table = dalc
        .execute_table("insert people", &mut [Param::new("name", "barbara")])
        .unwrap();
    assert!(table.is_none());

    let count = dalc.execute_scalar("count people", &mut []).unwrap();
    assert_eq!(count, Value::Integer(4));
}

#[test]
fn reader_streams_rows_then_releases_connection() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider.clone());

    let mut reader = dalc.execute_reader("select people", &mut []).unwrap();
    assert_eq!(provider.open_connections(), 1);
    assert_eq!(reader.columns().ordinal("name"), Some(0));

    let rows = reader.by_ref().collect::<dalc::Result<Vec<_>>>().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].get("name").as_text(), Some("grace"));

    // exhausting the cursor released the fresh connection...
    assert_eq!(provider.open_connections(), 0);

    // ...so a subsequent independent operation on the same provider works
    let count = dalc.execute_scalar("count people", &mut []).unwrap();
    assert_eq!(count, Value::Integer(3));
}

#[test]
fn reader_close_and_drop_release_the_connection() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider.clone());

    let mut reader = dalc.execute_reader("select people", &mut []).unwrap();
    reader.next_row().unwrap();
    reader.close();
    assert_eq!(provider.open_connections(), 0);
    // a closed reader yields no further rows
    assert!(reader.next_row().unwrap().is_none());
    drop(reader);

    let reader = dalc.execute_reader("select people", &mut []).unwrap();
    assert_eq!(provider.open_connections(), 1);
    drop(reader);
    assert_eq!(provider.open_connections(), 0);
}

#[test]
fn reader_leaves_a_transaction_connection_open() {
    let provider = seeded_provider();
    let mut dalc = Dalc::new(provider.clone());

    let tx = dalc.begin_transaction().unwrap();
    assert_eq!(provider.open_connections(), 1);

    let mut reader = dalc.execute_reader("select people", &mut []).unwrap();
    let rows = reader.by_ref().collect::<dalc::Result<Vec<_>>>().unwrap();
    assert_eq!(rows.len(), 3);
    drop(reader);

    // the transaction, not the reader, owns this connection
    assert_eq!(provider.open_connections(), 1);

    tx.commit().unwrap();
    dalc.close().unwrap();
    assert_eq!(provider.open_connections(), 0);
}

#[test]
fn output_parameters_are_copied_back() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider);

    let mut params = [Param::output("count")];
    dalc.execute_scalar("count people", &mut params).unwrap();
    assert_eq!(params[0].value, Value::Integer(3));
    // the size policy kicked in before the driver saw the parameter
    assert_eq!(params[0].size, Some(DEFAULT_OUTPUT_SIZE));

    let mut params = [Param::input_output("count", 0i64)];
    dalc.execute_non_query("count people", &mut params).unwrap();
    assert_eq!(params[0].value, Value::Integer(3));
}

#[test]
fn reader_populates_output_parameters_before_rows_are_read() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider);

    let mut params = [Param::output("count")];
    let mut reader = dalc.execute_reader("count people", &mut params).unwrap();

    // populated at cursor creation, ahead of the first row
    assert_eq!(params[0].value, Value::Integer(3));

    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.get("count"), &Value::Integer(3));
    assert!(reader.next_row().unwrap().is_none());
}

#[test]
fn failed_commands_release_the_connection_and_keep_the_cause() {
    let provider = seeded_provider();
    let dalc = Dalc::new(provider.clone());

    let err = dalc
        .execute_scalar("frobnicate people", &mut [Param::new("name", "x")])
        .unwrap_err();

    match &err {
        Error::Execute { command, .. } => {
            assert!(command.contains("frobnicate"));
            assert!(command.contains("name:x"));
        }
        other => panic!("expected Error::Execute, got {other:?}"),
    }
    assert_eq!(provider.open_connections(), 0);

    assert!(dalc.execute_reader("frobnicate people", &mut []).is_err());
    assert!(dalc.execute_table("frobnicate people", &mut []).is_err());
    assert_eq!(provider.open_connections(), 0);

    // the accessor stays usable
    let count = dalc.execute_scalar("count people", &mut []).unwrap();
    assert_eq!(count, Value::Integer(3));
}

use std::rc::Rc;

use dalc::{Dalc, Error, FinalizePolicy, MemoryProvider, Param};

fn insert_one(dalc: &Dalc, value: &str) {
    dalc.execute_non_query("insert notes", &mut [Param::new("str", value)])
        .unwrap();
}

fn row_count(dalc: &Dalc) -> i64 {
    dalc.execute_scalar("count notes", &mut [])
        .unwrap()
        .as_integer()
        .unwrap()
}

#[test]
fn commit_makes_rows_visible() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut dalc = Dalc::new(provider.clone());
    let tx = dalc.begin_transaction().unwrap();
    insert_one(&dalc, "a row");

    // visible inside the transaction, not outside
    assert_eq!(row_count(&dalc), 1);
    assert_eq!(row_count(&observer), 0);

    tx.commit().unwrap();
    assert_eq!(row_count(&observer), 1);
}

#[test]
fn rollback_discards_rows() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut dalc = Dalc::new(provider.clone());
    let tx = dalc.begin_transaction().unwrap();
    insert_one(&dalc, "a row");
    assert_eq!(row_count(&dalc), 1);

    tx.rollback().unwrap();
    drop(dalc);

    assert_eq!(row_count(&observer), 0);
}

#[test]
fn owner_drop_auto_commits_exactly_once() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut dalc = Dalc::new(provider.clone());
    let tx = dalc.begin_transaction().unwrap();
    insert_one(&dalc, "a row");
    drop(dalc);

    assert!(tx.is_committed());
    assert!(!tx.needs_finalization());
    assert!(tx.is_disposed());
    assert_eq!(row_count(&observer), 1);
    assert_eq!(provider.open_connections(), 0);
}

#[test]
fn finalize_policy_rollback_discards_on_drop() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut dalc = Dalc::new(provider.clone()).with_finalize_policy(FinalizePolicy::Rollback);
    let tx = dalc.begin_transaction().unwrap();
    insert_one(&dalc, "a row");
    drop(dalc);

    assert!(tx.is_rolled_back());
    assert!(tx.is_disposed());
    assert_eq!(row_count(&observer), 0);
}

#[test]
fn explicit_finalize_is_not_repeated_at_teardown() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut dalc = Dalc::new(provider.clone());
    let tx = dalc.begin_transaction().unwrap();
    insert_one(&dalc, "a row");
    tx.rollback().unwrap();
    drop(dalc);

    // the default commit-on-drop policy must not override the rollback
    assert!(tx.is_rolled_back());
    assert!(!tx.is_committed());
    assert_eq!(row_count(&observer), 0);
}

#[test]
fn borrowed_accessor_never_finalizes() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut outer = Dalc::new(provider.clone());
    let tx = outer.begin_transaction().unwrap();
    insert_one(&outer, "outer");

    {
        let inner = Dalc::from_transaction(&tx).unwrap();
        insert_one(&inner, "inner");
    }

    // dropping the borrowing accessor left the transaction untouched
    assert!(tx.needs_finalization());
    assert!(!tx.is_disposed());
    assert_eq!(row_count(&outer), 2);

    tx.commit().unwrap();
    drop(outer);
    assert_eq!(row_count(&observer), 2);
}

#[test]
fn shared_transaction_rollback_discards_all_work() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut outer = Dalc::new(provider.clone());
    let tx = outer.begin_transaction().unwrap();
    insert_one(&outer, "outer");

    let inner = Dalc::from_transaction(&tx).unwrap();
    insert_one(&inner, "inner");
    drop(inner);

    tx.rollback().unwrap();
    drop(outer);

    assert_eq!(row_count(&observer), 0);
}

#[test]
fn begin_twice_is_rejected() {
    let provider = Rc::new(MemoryProvider::new());

    let mut dalc = Dalc::new(provider);
    let _tx = dalc.begin_transaction().unwrap();

    assert!(matches!(
        dalc.begin_transaction(),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn double_finalize_is_rejected() {
    let provider = Rc::new(MemoryProvider::new());

    let mut dalc = Dalc::new(provider);
    let tx = dalc.begin_transaction().unwrap();
    tx.commit().unwrap();

    assert!(matches!(tx.commit(), Err(Error::InvalidOperation(_))));
    assert!(matches!(tx.rollback(), Err(Error::InvalidOperation(_))));
    assert!(!tx.needs_finalization());

    // accessor-level commit delegates to the same finalized handle
    assert!(matches!(dalc.commit(), Err(Error::InvalidOperation(_))));
}

#[test]
fn commit_without_transaction_is_a_noop() {
    let provider = Rc::new(MemoryProvider::new());
    let dalc = Dalc::new(provider);

    dalc.commit().unwrap();
    dalc.rollback().unwrap();
}

#[test]
fn close_is_explicit_and_idempotent() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut dalc = Dalc::new(provider.clone());
    let tx = dalc.begin_transaction().unwrap();
    insert_one(&dalc, "a row");

    dalc.close().unwrap();
    assert!(tx.is_committed());
    assert!(tx.is_disposed());
    assert_eq!(provider.open_connections(), 0);

    dalc.close().unwrap();
    drop(dalc);
    assert_eq!(row_count(&observer), 1);
}

#[test]
fn begin_after_close_is_rejected() {
    let provider = Rc::new(MemoryProvider::new());

    let mut dalc = Dalc::new(provider.clone());
    let first = dalc.begin_transaction().unwrap();
    first.commit().unwrap();
    dalc.close().unwrap();

    // closed accessors stay closed; a new accessor is the supported path
    assert!(matches!(
        dalc.begin_transaction(),
        Err(Error::InvalidOperation(_))
    ));
    let mut fresh = Dalc::new(provider);
    let second = fresh.begin_transaction().unwrap();
    second.commit().unwrap();
}

#[test]
fn borrowed_accessor_without_provider_reports_argument_errors() {
    let provider = Rc::new(MemoryProvider::new());

    let mut outer = Dalc::new(provider.clone());
    let tx = outer.begin_transaction().unwrap();
    let mut inner = Dalc::from_transaction(&tx).unwrap();

    // while the transaction lives, beginning another is an invalid operation
    assert!(matches!(
        inner.begin_transaction(),
        Err(Error::InvalidOperation(_))
    ));

    outer.close().unwrap();

    // once it is disposed the borrowing accessor has nowhere to connect
    assert!(matches!(
        inner.begin_transaction(),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        inner.execute_scalar("count notes", &mut []),
        Err(Error::Argument(_))
    ));

    // and building a new accessor from a disposed handle is rejected outright
    assert!(matches!(Dalc::from_transaction(&tx), Err(Error::Argument(_))));
}

#[test]
fn independent_transactions_do_not_interfere() {
    let provider = Rc::new(MemoryProvider::new());
    let observer = Dalc::new(provider.clone());

    let mut a = Dalc::new(provider.clone());
    let mut b = Dalc::new(provider.clone());
    let ta = a.begin_transaction().unwrap();
    let tb = b.begin_transaction().unwrap();

    insert_one(&a, "committed");
    insert_one(&b, "rolled back");

    ta.commit().unwrap();
    tb.rollback().unwrap();
    drop(a);
    drop(b);

    assert_eq!(row_count(&observer), 1);
    let table = observer
        .execute_table("select notes", &mut [])
        .unwrap()
        .unwrap();
    assert_eq!(table.rows()[0].get("str").as_text(), Some("committed"));
}

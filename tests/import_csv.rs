use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use stock_consolidator::StockError;
use stock_consolidator::consolidation::Consolidator;
use stock_consolidator::ingestion::csv::ingest_csv_inferred_from_path;
use stock_consolidator::types::{DataType, Value};
use stock_consolidator::validation::ValidationFailure;

const FIXTURES: &str = "tests/fixtures/furniture";

/// Fresh copy of the furniture database, since an import rewrites it.
fn database_copy(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("stock-consolidator-{name}-{nanos}.csv"));
    fs::copy(format!("{FIXTURES}/database.csv"), &path).unwrap();
    path
}

fn staging(db: &Path) -> PathBuf {
    let mut name = db.file_name().unwrap().to_os_string();
    name.push(".tmp");
    db.with_file_name(name)
}

fn incoming(file: &str) -> String {
    format!("{FIXTURES}/{file}")
}

#[test]
fn valid_import_appends_new_item_and_keeps_headers() {
    let db = database_copy("valid");
    let merged = Consolidator::default()
        .import_file(&db, incoming("incoming_valid.csv"))
        .unwrap();
    assert_eq!(merged.row_count(), 3);

    let reread = ingest_csv_inferred_from_path(&db).unwrap();
    assert_eq!(
        reread.schema.field_names().collect::<Vec<_>>(),
        vec!["Nom du Produit", "Quantité", "Prix Unitaire", "Catégorie"]
    );
    assert_eq!(reread.row_count(), 3);
    assert!(
        reread
            .rows
            .iter()
            .any(|r| r[0] == Value::Utf8("Armoire".to_string()))
    );

    fs::remove_file(db).ok();
}

#[test]
fn duplicate_item_quantities_are_summed() {
    let db = database_copy("duplicate");
    Consolidator::default()
        .import_file(&db, incoming("incoming_duplicate.csv"))
        .unwrap();

    let reread = ingest_csv_inferred_from_path(&db).unwrap();
    let chaises: Vec<_> = reread
        .rows
        .iter()
        .filter(|r| r[0] == Value::Utf8("Chaise".to_string()))
        .collect();
    assert_eq!(chaises.len(), 1);
    assert_eq!(chaises[0][1], Value::Int64(15));
    assert_eq!(chaises[0][2], Value::Float64(20.0));

    fs::remove_file(db).ok();
}

#[test]
fn import_leaves_no_staging_file_behind() {
    let db = database_copy("staging");
    Consolidator::default()
        .import_file(&db, incoming("incoming_valid.csv"))
        .unwrap();
    assert!(!staging(&db).exists());
    fs::remove_file(db).ok();
}

#[test]
fn failed_rewrite_keeps_database_intact() {
    let db = database_copy("failed-rewrite");
    let before = fs::read_to_string(&db).unwrap();
    // A directory in the staging slot makes the write fail before the rename.
    fs::create_dir(staging(&db)).unwrap();

    let err = Consolidator::default()
        .import_file(&db, incoming("incoming_valid.csv"))
        .unwrap_err();
    assert!(matches!(err, StockError::WriteFailure { .. }));
    assert_eq!(fs::read_to_string(&db).unwrap(), before);

    fs::remove_dir(staging(&db)).ok();
    fs::remove_file(db).ok();
}

#[test]
fn renamed_column_is_rejected_and_database_untouched() {
    let db = database_copy("renamed");
    let before = fs::read_to_string(&db).unwrap();

    let err = Consolidator::default()
        .import_file(&db, incoming("incoming_renamed.csv"))
        .unwrap_err();
    assert!(matches!(
        err,
        StockError::Validation(ValidationFailure::SchemaMismatch { .. })
    ));
    assert_eq!(fs::read_to_string(&db).unwrap(), before);

    fs::remove_file(db).ok();
}

#[test]
fn text_quantity_is_a_type_mismatch() {
    let db = database_copy("text-quantity");
    let err = Consolidator::default()
        .import_file(&db, incoming("incoming_text_quantity.csv"))
        .unwrap_err();
    match err {
        StockError::Validation(ValidationFailure::TypeMismatch {
            column,
            expected,
            found,
        }) => {
            assert_eq!(column, "Quantité");
            assert_eq!(expected, DataType::Int64);
            assert_eq!(found, DataType::Utf8);
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    fs::remove_file(db).ok();
}

#[test]
fn empty_cell_is_rejected() {
    let db = database_copy("empty-cell");
    let err = Consolidator::default()
        .import_file(&db, incoming("incoming_empty_cell.csv"))
        .unwrap_err();
    assert!(matches!(
        err,
        StockError::Validation(ValidationFailure::EmptyCell { row: 1, ref column }) if column == "Quantité"
    ));
    fs::remove_file(db).ok();
}

#[test]
fn missing_incoming_file_is_an_io_error() {
    let db = database_copy("missing");
    let err = Consolidator::default()
        .import_file(&db, incoming("does_not_exist.csv"))
        .unwrap_err();
    assert!(matches!(err, StockError::Csv(_) | StockError::Io(_)));
    fs::remove_file(db).ok();
}

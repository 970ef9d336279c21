use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::Duration;

use pos_daily_sales::aggregate::AggregateKey;
use pos_daily_sales::commit::CommitConfig;
use pos_daily_sales::db::{Cipher, FileStore, PointOfSale, PointOfSaleId, XChaCha20Poly1305Cipher};
use pos_daily_sales::error::ImportError;
use pos_daily_sales::import::InputFormat;
use pos_daily_sales::pipeline::import_batch;
use pos_daily_sales::store::InMemoryStore;

const HEADER: &str = "Id;Fecha;Importe;Comercio;Estado;MedioPagoDescripcion";

fn export(lines: &[&str]) -> String {
    let mut content = HEADER.to_string();
    for line in lines {
        content.push('\n');
        content.push_str(line);
    }
    content.push('\n');
    content
}

fn html_export(rows: &[[&str; 8]]) -> String {
    let mut content = String::from(
        "<html><body><table>\
         <tr><th>Nro</th><th>Fecha</th><th>Hora</th><th>Lote</th><th>Comercio</th>\
         <th>Concepto</th><th>Cuotas</th><th>Importe</th></tr>",
    );
    for row in rows {
        content.push_str("<tr>");
        for cell in row {
            content.push_str(&format!("<td>{cell}</td>"));
        }
        content.push_str("</tr>");
    }
    content.push_str("</table></body></html>");
    content
}

fn date(day: u32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn store() -> InMemoryStore {
    InMemoryStore::with_points_of_sale([PointOfSaleId(101), PointOfSaleId(102)])
}

#[tokio::test]
async fn accredited_and_rejected_rows_of_one_day() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 09:15:00;1000,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 10:30:00;250,555;C101;ACREDITADO;Tarjetacredito",
        "TX3;2/5/2025 11:45:00;300,00;C101;RECHAZADO;Tarjetadebito",
        "TX4;2/5/2025 12:00:00;49,995;C101;ACREDITADO;Transf30",
    ]);

    let summary = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap();

    assert_eq!(1, summary.inserted);
    let record = &summary.records[0];
    assert_eq!(AggregateKey::new(PointOfSaleId(101), date(2, 5)), record.key);
    assert_eq!(4, record.total_transactions_count);
    assert_eq!(3, record.valid_transactions_count);
    assert_eq!(Decimal::new(100000, 2), record.debit_sales);
    assert_eq!(Decimal::new(25056, 2), record.credit_sales);
    assert_eq!(Decimal::new(5000, 2), record.qr_sales);
    assert_eq!(Decimal::new(130056, 2), record.total_sales);
    assert_eq!(record.channel_sum(), record.total_sales);
}

#[tokio::test]
async fn records_are_sorted_by_point_of_sale_then_date() {
    let store = store();
    let content = export(&[
        "TX1;3/5/2025 10:00;1,00;C102;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 10:00;1,00;C102;ACREDITADO;Tarjetadebito",
        "TX3;3/5/2025 10:00;1,00;C101;ACREDITADO;Tarjetadebito",
        "TX4;1/5/2025 10:00;1,00;C101;ACREDITADO;Tarjetadebito",
    ]);

    let summary = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap();

    let keys: Vec<AggregateKey> = summary.records.iter().map(|record| record.key).collect();
    assert_eq!(
        vec![
            AggregateKey::new(PointOfSaleId(101), date(1, 5)),
            AggregateKey::new(PointOfSaleId(101), date(3, 5)),
            AggregateKey::new(PointOfSaleId(102), date(2, 5)),
            AggregateKey::new(PointOfSaleId(102), date(3, 5)),
        ],
        keys
    );
}

#[tokio::test]
async fn late_evening_transaction_stays_on_its_own_day() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 23:50:00;80,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;3/5/2025 00:05:00;20,00;C101;ACREDITADO;Tarjetadebito",
    ]);

    let summary = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap();
    assert_eq!(date(2, 5), summary.records[0].key.date);
    assert_eq!(Decimal::new(8000, 2), summary.records[0].total_sales);
    assert_eq!(date(3, 5), summary.records[1].key.date);

    // The refusal names the same day the transaction was grouped under
    let again = export(&["TX9;2/5/2025 23:50:00;1,00;C101;ACREDITADO;Tarjetadebito"]);
    let err = import_batch(&store, InputFormat::Tabular, &again, &CommitConfig::default())
        .await
        .unwrap_err();
    let ImportError::AlreadyPersisted { keys } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(&vec![AggregateKey::new(PointOfSaleId(101), date(2, 5))], keys);
    assert!(err.to_string().contains("101 - 2025-05-02"), "{err}");
}

#[tokio::test]
async fn duplicate_transaction_ids_block_the_batch() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 10:00;10,00;C101;ACREDITADO;Tarjetadebito",
        "TX1;2/5/2025 11:00;20,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 12:00;30,00;C101;ACREDITADO;Tarjetadebito",
    ]);

    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    assert_eq!(
        "Found duplicate transaction IDs in the file: TX1 (lines 2, 3). Nothing was imported.",
        err.to_string()
    );
    assert!(store.snapshot().await.daily_sales.is_empty());
}

#[tokio::test]
async fn point_of_sale_without_prefix_blocks_the_batch() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 10:00;10,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 11:00;20,00;X123;ACREDITADO;Tarjetadebito",
    ]);

    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(
        message.contains("Line 3: Point of sale 'X123' doesn't have the expected format"),
        "{message}"
    );
    assert!(store.snapshot().await.daily_sales.is_empty());
}

#[tokio::test]
async fn every_invalid_date_is_reported() {
    let store = store();
    let content = export(&[
        "TX1;31/2/2025 10:00;10,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 11:00;20,00;C101;ACREDITADO;Tarjetadebito",
        "TX3;15/13/2025 12:00;30,00;C101;ACREDITADO;Tarjetadebito",
    ]);

    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    let ImportError::Validation { problems } = &err else {
        panic!("unexpected error: {err:?}");
    };
    let lines: Vec<u64> = problems.iter().map(|problem| problem.line).collect();
    assert_eq!(vec![2, 4], lines);
    assert!(store.snapshot().await.daily_sales.is_empty());
}

#[tokio::test]
async fn sums_beyond_the_amount_range_are_refused() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 10:00;79228162514264337593543950335;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 11:00;79228162514264337593543950335;C101;ACREDITADO;Tarjetadebito",
    ]);

    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    let ImportError::Validation { problems } = &err else {
        panic!("unexpected error: {err:?}");
    };
    let lines: Vec<u64> = problems.iter().map(|problem| problem.line).collect();
    assert_eq!(vec![3], lines);
    assert!(store.snapshot().await.daily_sales.is_empty());
}

#[tokio::test]
async fn total_beyond_the_amount_range_is_refused() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 10:00;50000000000000000000000000000;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 11:00;50000000000000000000000000000;C101;ACREDITADO;Tarjetacredito",
    ]);

    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Validation { .. }), "{err:?}");
    assert!(err.to_string().contains("Total sales of 101 - 2025-05-02 are too large"), "{err}");
    assert!(store.snapshot().await.daily_sales.is_empty());
}

#[tokio::test]
async fn unknown_points_of_sale_are_all_named() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 10:00;10,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;2/5/2025 11:00;20,00;C555;ACREDITADO;Tarjetadebito",
        "TX3;2/5/2025 12:00;30,00;C444;ACREDITADO;Tarjetadebito",
    ]);

    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    assert_eq!(
        "The following points of sale are not registered: 444, 555. Nothing was imported.",
        err.to_string()
    );
    assert!(store.snapshot().await.daily_sales.is_empty());
}

#[tokio::test]
async fn submitting_the_same_batch_twice_stores_it_once() {
    let store = store();
    let content = export(&[
        "TX1;2/5/2025 10:00;10,00;C101;ACREDITADO;Tarjetadebito",
        "TX2;3/5/2025 11:00;20,00;C102;ACREDITADO;Tarjetadebito",
    ]);

    import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap();
    let after_first = store.snapshot().await;
    let err = import_batch(&store, InputFormat::Tabular, &content, &CommitConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::AlreadyPersisted { ref keys } if keys.len() == 2), "{err:?}");
    assert_eq!(after_first, store.snapshot().await);
}

#[tokio::test]
async fn empty_export_is_refused() {
    let err = import_batch(&store(), InputFormat::Tabular, &export(&[]), &CommitConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::EmptyInput), "{err:?}");
}

#[tokio::test]
async fn html_export_sums_channels_by_concept() {
    let store = store();
    let content = html_export(&[
        ["1", "02/05/2025", "10:00", "7", "101", "OPERACION COBRO QR", "1", "1500,50"],
        ["2", "02/05/2025", "11:00", "7", "101", "Operacion Tarjeta Debito (PRISMA-WEB)", "1", "200,00"],
        ["3", "02/05/2025", "12:00", "7", "101", "OPERACION TRANSFERENCIA", "1", "50,25"],
        ["4", "02/05/2025", "13:00", "7", "101", "COMISION", "1", "-10,00"],
        ["5", "02/05/2025", "14:00", "7", "102", "QR MAX", "1", "99,99"],
    ]);

    let summary = import_batch(&store, InputFormat::Html, &content, &CommitConfig::default())
        .await
        .unwrap();

    assert_eq!(2, summary.inserted);
    let record = &summary.records[0];
    assert_eq!(AggregateKey::new(PointOfSaleId(101), date(2, 5)), record.key);
    assert_eq!(4, record.total_transactions_count);
    assert_eq!(Decimal::new(150050, 2), record.qr_sales);
    assert_eq!(Decimal::new(20000, 2), record.debit_sales);
    assert_eq!(Decimal::new(5025, 2), record.transfer_sales);
    assert_eq!(Decimal::new(175075, 2), record.total_sales);
    assert_eq!(Decimal::new(9999, 2), summary.records[1].qr_sales);
}

#[tokio::test]
async fn html_without_table_is_a_parse_error() {
    let err = import_batch(
        &store(),
        InputFormat::Html,
        "<html><body><p>Sin movimientos</p></body></html>",
        &CommitConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ImportError::Parse(_)), "{err:?}");
}

#[tokio::test]
async fn file_store_keeps_batches_across_reopening() {
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("sales.db");
    let key = XChaCha20Poly1305Cipher::new_key();

    let store = FileStore::new(path.clone(), XChaCha20Poly1305Cipher::with_key(&key));
    store.create().await.unwrap();
    store
        .update(|db| db.add_point_of_sale(PointOfSaleId(101), PointOfSale::new("Centro".to_string())))
        .await
        .unwrap();
    let content = export(&["TX1;2/5/2025 23:50;10,00;C101;ACREDITADO;Tarjetadebito"]);
    let limits = CommitConfig {
        max_wait: Duration::from_secs(5),
        timeout: Duration::from_secs(5),
    };
    import_batch(&store, InputFormat::Tabular, &content, &limits)
        .await
        .unwrap();

    let reopened = FileStore::new(path, XChaCha20Poly1305Cipher::with_key(&key));
    let err = import_batch(&reopened, InputFormat::Tabular, &content, &limits)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::AlreadyPersisted { .. }), "{err:?}");
    assert_eq!(1, reopened.load().await.unwrap().daily_sales.len());
}

use anyhow::{Context as _, Result};
use console::{pad_str, style, Alignment, StyledObject};
use rust_decimal::Decimal;
use std::path::Path;

use crate::aggregate::AggregateRecord;
use crate::args::{Args, Command};
use crate::commit::CommitConfig;
use crate::config::Config;
use crate::db::{encode_key, Cipher, FileStore, PointOfSale, PointOfSaleId, XChaCha20Poly1305Cipher};
use crate::import::InputFormat;
use crate::pipeline::import_batch;
use crate::terminal::{self, BulletPointPrinter, LineWriter, StdoutLineWriter};

pub async fn main(args: Args) -> Result<()> {
    let config = Config::from_args(&args);
    match args.command {
        Command::GenerateKey => {
            main_generate_key(&StdoutLineWriter);
            Ok(())
        }
        Command::Init => Cli::new(&config)?.main_init().await,
        Command::AddPointOfSale { id, name } => {
            let name = match name {
                Some(name) => name,
                None => terminal::prompt(&format!("Name of point of sale {id}"))?,
            };
            Cli::new(&config)?.main_add_point_of_sale(id, name).await
        }
        Command::ListPointsOfSale => Cli::new(&config)?.main_list_points_of_sale().await,
        Command::Import { file, format } => Cli::new(&config)?.main_import(&file, format).await,
        Command::ListSales { point_of_sale } => {
            Cli::new(&config)?.main_list_sales(point_of_sale).await
        }
    }
}

fn main_generate_key(out: &impl LineWriter) {
    let key = XChaCha20Poly1305Cipher::new_key();
    out.write_line(&encode_key(&key));
}

pub struct Cli<W: LineWriter + Clone> {
    store: FileStore,
    commit: CommitConfig,
    out: W,
}

impl Cli<StdoutLineWriter> {
    pub fn new(config: &Config) -> Result<Self> {
        let cipher = XChaCha20Poly1305Cipher::with_key(&config.db_key()?);
        Ok(Self::with_writer(
            FileStore::new(config.db_path.clone(), cipher),
            config.commit,
            StdoutLineWriter,
        ))
    }
}

impl<W: LineWriter + Clone> Cli<W> {
    pub fn with_writer(store: FileStore, commit: CommitConfig, out: W) -> Self {
        Self { store, commit, out }
    }

    fn printer(&self) -> BulletPointPrinter<W> {
        BulletPointPrinter::new(self.out.clone())
    }

    fn header(&self, header: &str) {
        self.out.write_line(&style_header(header).to_string());
    }

    pub async fn main_init(&self) -> Result<()> {
        self.store.create().await?;
        self.header("Created database:");
        self.printer()
            .print_item(style(self.store.path().display()).cyan());
        Ok(())
    }

    pub async fn main_add_point_of_sale(&self, id: PointOfSaleId, name: String) -> Result<()> {
        let point_of_sale = PointOfSale::new(name);
        self.store
            .update(|db| db.add_point_of_sale(id, point_of_sale.clone()))
            .await?;
        self.header("Added point of sale:");
        print_point_of_sale(&self.printer(), id, &point_of_sale);
        Ok(())
    }

    pub async fn main_list_points_of_sale(&self) -> Result<()> {
        let db = self.store.load().await?;
        self.header("Points of sale:");
        let printer = self.printer();
        if db.points_of_sale.is_empty() {
            printer.print_item(style("(none)").italic());
        }
        for (id, point_of_sale) in &db.points_of_sale {
            print_point_of_sale(&printer, *id, point_of_sale);
        }
        Ok(())
    }

    pub async fn main_import(&self, file: &Path, format: Option<InputFormat>) -> Result<()> {
        let format = format.unwrap_or_else(|| InputFormat::from_path(file));
        let content = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let content = String::from_utf8(content)
            .with_context(|| format!("{} isn't valid UTF-8", file.display()))?;

        let summary = import_batch(&self.store, format, &content, &self.commit)
            .await
            .with_context(|| format!("Import of {} refused", file.display()))?;

        self.header(&format!("Imported {} daily summaries:", summary.inserted));
        let printer = self.printer();
        for record in &summary.records {
            printer.print_item(style_point_of_sale_id(record.key.point_of_sale_id));
            print_daily_sales(&printer.indent(), record);
        }
        Ok(())
    }

    pub async fn main_list_sales(&self, point_of_sale: Option<PointOfSaleId>) -> Result<()> {
        let db = self.store.load().await?;
        self.header("Daily sales:");
        let printer = self.printer();
        let selected = db
            .points_of_sale
            .iter()
            .filter(|(id, _)| point_of_sale.map_or(true, |selected| selected == **id));
        for (id, pos) in selected {
            print_point_of_sale(&printer, *id, pos);
            let printer = printer.indent();
            let mut sales = db.daily_sales_of(*id).peekable();
            if sales.peek().is_none() {
                printer.print_item(style("(none)").italic());
            }
            for daily_sales in sales {
                print_daily_sales(&printer, &daily_sales.record);
            }
        }
        Ok(())
    }
}

fn print_point_of_sale<W: LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    id: PointOfSaleId,
    point_of_sale: &PointOfSale,
) {
    printer.print_item(format!(
        "{} {}",
        style_point_of_sale_id(id),
        style_point_of_sale_name(&point_of_sale.name),
    ));
}

fn print_daily_sales<W: LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    record: &AggregateRecord,
) {
    printer.print_item(format!(
        "{} {} {}",
        pad_str(
            &style_date(&record.key.date).to_string(),
            10,
            Alignment::Left,
            None
        ),
        pad_str(
            &style_amount(&record.total_sales).to_string(),
            15,
            Alignment::Right,
            None
        ),
        style_counts(record),
    ));
    let printer = printer.indent();
    for (channel, amount) in [
        ("QR", record.qr_sales),
        ("Debit", record.debit_sales),
        ("Credit", record.credit_sales),
        ("Transfer", record.transfer_sales),
    ] {
        if !amount.is_zero() {
            printer.print_item(format!(
                "{} {}",
                pad_str(channel, 8, Alignment::Left, None),
                pad_str(
                    &style_amount(&amount).to_string(),
                    15,
                    Alignment::Right,
                    None
                ),
            ));
        }
    }
}

fn style_header(header: &str) -> StyledObject<&str> {
    style(header).bold().underlined()
}

fn style_point_of_sale_id(id: PointOfSaleId) -> StyledObject<PointOfSaleId> {
    style(id).cyan().bold()
}

fn style_point_of_sale_name(name: &str) -> StyledObject<&str> {
    style(name).magenta()
}

fn style_date(date: &chrono::NaiveDate) -> StyledObject<String> {
    style(date.format("%Y-%m-%d").to_string())
}

fn style_amount(amount: &Decimal) -> StyledObject<String> {
    let result = style(format!("{amount:.2}")).bold();
    if *amount < Decimal::ZERO {
        result.red()
    } else {
        result.green()
    }
}

fn style_counts(record: &AggregateRecord) -> StyledObject<String> {
    style(format!(
        "{} of {} transactions accredited",
        record.valid_transactions_count, record.total_transactions_count
    ))
    .italic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::crypto_testutils::cipher;
    use crate::terminal::BufferLineWriter;

    const EXPORT: &str = "Id;Fecha;Importe;Comercio;Estado;MedioPagoDescripcion\n\
                          TX1;2/5/2025 10:00;1500,50;C101;ACREDITADO;Transf30\n\
                          TX2;2/5/2025 11:00;20,00;C101;ACREDITADO;Tarjetadebito\n\
                          TX3;2/5/2025 12:00;99,00;C101;RECHAZADO;Tarjetadebito\n";

    async fn cli(dir: &Path) -> (Cli<BufferLineWriter>, BufferLineWriter) {
        let out = BufferLineWriter::default();
        let cli = Cli::with_writer(
            FileStore::new(dir.join("sales.db"), cipher(1)),
            CommitConfig::default(),
            out.clone(),
        );
        cli.main_init().await.unwrap();
        cli.main_add_point_of_sale(PointOfSaleId(101), "Centro".to_string())
            .await
            .unwrap();
        (cli, out)
    }

    #[test]
    fn generated_key_is_usable() {
        let out = BufferLineWriter::default();
        main_generate_key(&out);
        let lines = out.lines();
        assert_eq!(1, lines.len());
        crate::db::decode_key(&lines[0]).unwrap();
    }

    #[tokio::test]
    async fn import_then_list_sales() {
        let tempdir = tempfile::tempdir().unwrap();
        let (cli, out) = cli(tempdir.path()).await;
        let file = tempdir.path().join("export.csv");
        tokio::fs::write(&file, EXPORT).await.unwrap();

        cli.main_import(&file, None).await.unwrap();
        cli.main_list_sales(Some(PointOfSaleId(101))).await.unwrap();

        let output = out.lines().join("\n");
        assert!(output.contains("Imported 1 daily summaries:"), "{output}");
        assert!(output.contains("2 of 3 transactions accredited"), "{output}");
        assert!(output.contains("1520.50"), "{output}");
        assert!(output.contains("Centro"), "{output}");
    }

    #[tokio::test]
    async fn second_import_of_same_file_is_refused() {
        let tempdir = tempfile::tempdir().unwrap();
        let (cli, _out) = cli(tempdir.path()).await;
        let file = tempdir.path().join("export.csv");
        tokio::fs::write(&file, EXPORT).await.unwrap();

        cli.main_import(&file, None).await.unwrap();
        let err = cli.main_import(&file, None).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("101 - 2025-05-02"), "{message}");
        assert_eq!(1, cli.store.load().await.unwrap().daily_sales.len());
    }

    #[tokio::test]
    async fn adding_point_of_sale_twice_fails() {
        let tempdir = tempfile::tempdir().unwrap();
        let (cli, _out) = cli(tempdir.path()).await;
        assert!(cli
            .main_add_point_of_sale(PointOfSaleId(101), "Otro".to_string())
            .await
            .is_err());
    }
}

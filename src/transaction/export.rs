//! Writes transactions as a CSV file that spreadsheet tools open correctly.

use crate::{Error, date_format::format_date, transaction::core::Transaction};

/// The UTF-8 byte order mark. Spreadsheet tools need it to show accented
/// characters correctly.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The header row of the export.
pub const CSV_HEADER: [&str; 6] = ["Fecha", "Tipo", "Categoría", "Descripción", "Monto", "Moneda"];

/// Write `transactions` as a BOM-prefixed CSV document.
///
/// # Errors
/// Returns [Error::CsvError] if a row could not be written.
pub fn write_transactions_csv(transactions: &[Transaction]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for transaction in transactions {
        writer
            .write_record([
                format_date(transaction.date).as_str(),
                transaction.transaction_type.label(),
                transaction.category_name.as_str(),
                transaction.description.as_str(),
                format!("{:.2}", transaction.amount).as_str(),
                transaction.currency.as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

fn csv_error(error: csv::Error) -> Error {
    Error::CsvError(error.to_string())
}

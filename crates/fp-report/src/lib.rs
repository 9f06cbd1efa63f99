//! Daily report: aggregation, spreadsheet and CSV export, and the exports
//! directory the admin panel downloads from.

mod aggregate;
mod exports;
mod orders_csv;
mod regenerate;
mod window;
mod workbook;

pub use aggregate::{aggregate_day, DailyReport, ExpenseLine, OrderLine, StatusLine};
pub use exports::ExportsDir;
pub use orders_csv::write_orders_csv;
pub use regenerate::{build_daily_report, regenerate_daily_workbook, RegeneratedWorkbook};
pub use window::{day_window, local_today};
pub use workbook::write_workbook;

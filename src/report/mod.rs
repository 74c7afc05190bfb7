//! Monthly and yearly income and expense reports.

mod endpoints;
mod summary;

pub use endpoints::{monthly_report_endpoint, yearly_report_endpoint};
pub use summary::{
    CategorySummary, MonthlySummary, MonthlyTotals, YearlySummary, get_monthly_summary,
    get_yearly_summary,
};

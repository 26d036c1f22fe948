pub mod formatter;

pub use formatter::{
    format_headline, format_ranked_table, format_summary, should_use_colors, summary_rows,
    Severity, SummaryRow,
};

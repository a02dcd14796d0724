pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, section, severity_line, status, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{conflicts_table, stats_table, suggestions_table, TableBuilder};
pub use theme::{theme, Theme};

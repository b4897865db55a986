pub mod csv;
pub mod table;

pub use self::csv::{
    clean_bag_csv, csv_file_name, save_clean_bag, save_spam_bag, token_cells, write_clean_bag, write_spam_bag,
    CLEAN_BAG_HEADERS, SPAM_BAG_HEADERS,
};
pub use table::{render_breakdown, render_clean_table, render_spam_table};

use crate::models::{PricedToken, TokenRecord};
use crate::pipeline::TokenTypeShare;

/// Widest a cell may get before it is cut with an ellipsis
const MAX_CELL_WIDTH: usize = 32;

const CLEAN_COLUMNS: [&str; 7] = [
    "last_updated",
    "title",
    "contract_address",
    "token_type",
    "opensea_floorprice",
    "opensea_currency",
    "looksrare_floorprice",
];

const SPAM_COLUMNS: [&str; 4] = ["last_updated", "title", "contract_address", "token_type"];

/// Console rendering of the clean bag. Descriptions and token URIs are left
/// out to keep rows on one line; the CSV carries every column.
pub fn render_clean_table(rows: &[PricedToken]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let [opensea_price, opensea_currency, looksrare_price, _] = row.price.display_cells();
            let mut cells = summary_cells(&row.token).to_vec();
            cells.extend([opensea_price, opensea_currency, looksrare_price]);
            cells
        })
        .collect();

    render(&CLEAN_COLUMNS, &body)
}

pub fn render_spam_table(rows: &[TokenRecord]) -> String {
    let body: Vec<Vec<String>> = rows.iter().map(|row| summary_cells(row).to_vec()).collect();
    render(&SPAM_COLUMNS, &body)
}

/// One line per token type, e.g. `ERC721: 66.67% (2)`
pub fn render_breakdown(shares: &[TokenTypeShare]) -> String {
    if shares.is_empty() {
        return "  (none)\n".to_string();
    }

    shares
        .iter()
        .map(|share| format!("  {}: {:.2}% ({})\n", share.token_type, share.percentage, share.count))
        .collect()
}

fn summary_cells(row: &TokenRecord) -> [String; 4] {
    [
        row.last_updated
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        row.title.clone().unwrap_or_default(),
        row.contract_address.clone().unwrap_or_default(),
        row.token_type.clone().unwrap_or_default(),
    ]
}

fn render(headers: &[&str], body: &[Vec<String>]) -> String {
    if body.is_empty() {
        return "(no tokens)\n".to_string();
    }

    let body: Vec<Vec<String>> = body
        .iter()
        .map(|row| row.iter().map(|cell| truncate(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(|h| h.to_string()), &widths);
    push_line(&mut out, widths.iter().map(|w| "-".repeat(*w)), &widths);
    for row in body {
        push_line(&mut out, row.into_iter(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}

fn truncate(cell: &str) -> String {
    let single_line = cell.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= MAX_CELL_WIDTH {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FloorPriceRow, NOT_AVAILABLE};

    fn token(title: &str) -> TokenRecord {
        TokenRecord {
            last_updated: None,
            title: Some(title.to_string()),
            description: None,
            contract_address: Some("0xabc".to_string()),
            token_type: Some("ERC1155".to_string()),
            raw_token_uri: None,
        }
    }

    #[test]
    fn test_spam_table_aligns_columns() {
        let table = render_spam_table(&[token("Free Mint"), token("X")]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("last_updated | title"));
        let pipe = lines[0].find("| contract_address").unwrap();
        assert_eq!(lines[2].find("| 0xabc"), Some(pipe));
        assert_eq!(lines[3].find("| 0xabc"), Some(pipe));
    }

    #[test]
    fn test_clean_table_shows_placeholder() {
        let rows = vec![PricedToken {
            token: token("Ape"),
            price: FloorPriceRow::unavailable(None),
        }];
        let table = render_clean_table(&rows);
        assert!(table.contains(NOT_AVAILABLE));
    }

    #[test]
    fn test_long_titles_are_cut() {
        let long = "a".repeat(80);
        let table = render_spam_table(&[token(&long)]);
        assert!(!table.contains(&long));
        assert!(table.contains("..."));
    }

    #[test]
    fn test_empty_tables_and_breakdown() {
        assert_eq!(render_spam_table(&[]), "(no tokens)\n");
        assert_eq!(render_breakdown(&[]), "  (none)\n");

        let shares = vec![TokenTypeShare {
            token_type: "ERC721".to_string(),
            count: 2,
            percentage: 200.0 / 3.0,
        }];
        assert_eq!(render_breakdown(&shares), "  ERC721: 66.67% (2)\n");
    }
}

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde_json::Value;
use crate::error::ProcessingError;
use crate::models::{OwnedNft, Page, TokenRecord};

/// Flatten a query's pages into one token table.
///
/// Rows come out in page order, then in each page's list order. A page with no
/// tokens adds no rows, but a page without an `ownedNfts` field at all is
/// treated as malformed and fails the whole table.
pub fn normalize_pages(pages: &[Page]) -> Result<Vec<TokenRecord>, ProcessingError> {
    let mut rows = Vec::with_capacity(pages.iter().map(Page::token_count).sum());

    for (index, page) in pages.iter().enumerate() {
        let owned = page.owned_nfts.as_ref().ok_or_else(|| {
            ProcessingError::MalformedResponse(format!("page {} has no ownedNfts field", index + 1))
        })?;

        for nft in owned {
            rows.push(flatten_token(nft)?);
        }
    }

    Ok(rows)
}

fn flatten_token(nft: &OwnedNft) -> Result<TokenRecord, ProcessingError> {
    let last_updated = match nft.time_last_updated.as_deref() {
        Some(raw) => parse_timestamp(raw)?,
        None => None,
    };

    Ok(TokenRecord {
        last_updated,
        title: nft.title.clone(),
        description: nft.description.as_ref().and_then(flatten_description),
        contract_address: nft.contract.as_ref().and_then(|c| c.address.clone()),
        token_type: nft
            .id
            .as_ref()
            .and_then(|id| id.token_metadata.as_ref())
            .and_then(|meta| meta.token_type.clone()),
        raw_token_uri: nft.token_uri.as_ref().and_then(|uri| uri.raw.clone()),
    })
}

/// Parse a provider timestamp down to whole seconds.
/// Empty strings mean "unknown" and yield `None`.
pub fn parse_timestamp(raw: &str) -> Result<Option<NaiveDateTime>, ProcessingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| ProcessingError::MalformedResponse(format!("unreadable timestamp {}: {}", trimmed, e)))?;

    Ok(parsed.with_nanosecond(0))
}

fn flatten_description(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let lines: Vec<String> = parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(text) => Some(text.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Some(lines.join(" "))
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(value: Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    fn nft(title: &str) -> Value {
        json!({
            "contract": { "address": format!("0x{}", title.to_lowercase()) },
            "id": { "tokenId": "0x01", "tokenMetadata": { "tokenType": "ERC721" } },
            "title": title,
            "description": format!("{} description", title),
            "tokenUri": { "raw": format!("ipfs://{}", title) },
            "timeLastUpdated": "2023-01-04T12:34:56.789Z"
        })
    }

    #[test]
    fn test_rows_follow_page_order() {
        let pages = vec![
            page(json!({ "ownedNfts": [nft("A"), nft("B")], "pageKey": "k1" })),
            page(json!({ "ownedNfts": [nft("C")] })),
        ];

        let rows = normalize_pages(&pages).unwrap();
        let titles: Vec<&str> = rows.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_columns_are_flattened() {
        let rows = normalize_pages(&[page(json!({ "ownedNfts": [nft("Ape")] }))]).unwrap();
        let row = &rows[0];

        assert_eq!(row.contract_address.as_deref(), Some("0xape"));
        assert_eq!(row.token_type.as_deref(), Some("ERC721"));
        assert_eq!(row.raw_token_uri.as_deref(), Some("ipfs://Ape"));
        assert_eq!(row.description.as_deref(), Some("Ape description"));
        let last_updated = row.last_updated.unwrap();
        assert_eq!(last_updated.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-01-04 12:34:56");
        assert_eq!(last_updated.nanosecond(), 0);
    }

    #[test]
    fn test_empty_pages_and_sequences() {
        assert!(normalize_pages(&[]).unwrap().is_empty());

        let rows = normalize_pages(&[page(json!({ "ownedNfts": [] }))]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_owned_nfts_is_malformed() {
        let pages = vec![
            page(json!({ "ownedNfts": [nft("A")] })),
            page(json!({ "pageKey": "" })),
        ];

        let error = normalize_pages(&pages).unwrap_err();
        assert!(matches!(error, ProcessingError::MalformedResponse(ref msg) if msg.contains("page 2")));
    }

    #[test]
    fn test_sparse_token_keeps_row() {
        let rows = normalize_pages(&[page(json!({ "ownedNfts": [{ "title": "Bare" }] }))]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("Bare"));
        assert!(rows[0].contract_address.is_none());
        assert!(rows[0].last_updated.is_none());
    }

    #[test]
    fn test_description_list_is_joined() {
        let mut token = nft("A");
        token["description"] = json!(["line one", "line two"]);
        let rows = normalize_pages(&[page(json!({ "ownedNfts": [token] }))]).unwrap();
        assert_eq!(rows[0].description.as_deref(), Some("line one line two"));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("").unwrap().is_none());
        assert!(parse_timestamp("2022-11-30T08:00:00Z").unwrap().is_some());
        assert!(parse_timestamp("2022-11-30T08:00:00.123456").unwrap().is_some());
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ProcessingError::MalformedResponse(ref msg)) if msg.contains("yesterday")
        ));

        let offset = parse_timestamp("2022-11-30T10:00:00+02:00").unwrap().unwrap();
        assert_eq!(offset.format("%H:%M:%S").to_string(), "08:00:00");
    }
}

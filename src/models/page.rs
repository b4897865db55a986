use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `getNFTs` response page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Owned tokens on this page; absent in malformed or error responses
    #[serde(default)]
    pub owned_nfts: Option<Vec<OwnedNft>>,
    /// Continuation token, present while more pages exist
    #[serde(default)]
    pub page_key: Option<String>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<String>,
}

impl Page {
    /// The continuation token, if it is present and non-empty
    pub fn continuation(&self) -> Option<&str> {
        self.page_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn token_count(&self) -> usize {
        self.owned_nfts.as_ref().map_or(0, Vec::len)
    }
}

/// One owned token as the provider nests it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedNft {
    #[serde(default)]
    pub contract: Option<ContractRef>,
    #[serde(default)]
    pub id: Option<TokenId>,
    #[serde(default)]
    pub title: Option<String>,
    /// Usually a string, sometimes a list of strings
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub token_uri: Option<TokenUri>,
    #[serde(default)]
    pub time_last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRef {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenId {
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub token_metadata: Option<TokenMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUri {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_decoding() {
        let page: Page = serde_json::from_value(json!({
            "ownedNfts": [{
                "contract": { "address": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d" },
                "id": { "tokenId": "0x01", "tokenMetadata": { "tokenType": "ERC721" } },
                "title": "Ape #1",
                "description": "An ape",
                "tokenUri": { "raw": "ipfs://Qm/1", "gateway": "https://ipfs.io/ipfs/Qm/1" },
                "timeLastUpdated": "2023-01-04T12:34:56.789Z",
                "metadata": { "image": "ipfs://img" }
            }],
            "pageKey": "abc",
            "totalCount": 120,
            "blockHash": "0xfeed"
        })).unwrap();

        assert_eq!(page.token_count(), 1);
        assert_eq!(page.continuation(), Some("abc"));
        assert_eq!(page.total_count, Some(120));

        let nft = &page.owned_nfts.as_ref().unwrap()[0];
        assert_eq!(nft.title.as_deref(), Some("Ape #1"));
        assert_eq!(
            nft.id.as_ref().and_then(|id| id.token_metadata.as_ref()).and_then(|m| m.token_type.as_deref()),
            Some("ERC721")
        );
    }

    #[test]
    fn test_continuation_rules() {
        let last: Page = serde_json::from_value(json!({ "ownedNfts": [] })).unwrap();
        assert_eq!(last.continuation(), None);

        let empty_key: Page = serde_json::from_value(json!({ "ownedNfts": [], "pageKey": "" })).unwrap();
        assert_eq!(empty_key.continuation(), None);

        let null_key: Page = serde_json::from_value(json!({ "ownedNfts": [], "pageKey": null })).unwrap();
        assert_eq!(null_key.continuation(), None);
    }

    #[test]
    fn test_missing_owned_nfts_decodes_as_none() {
        let page: Page = serde_json::from_value(json!({ "error": "bad owner" })).unwrap();
        assert!(page.owned_nfts.is_none());
        assert_eq!(page.token_count(), 0);
    }
}

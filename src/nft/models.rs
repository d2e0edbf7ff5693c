// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};

/// Token upload request as sent by clients of `POST /token`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenInput {
    pub tokenname: String,
    /// Forwarded verbatim as the upstream `Authorization` header
    pub bearer: String,
    pub displayname: String,
    pub description: String,
    #[serde(rename = "fileFromIPFS")]
    pub file_from_ipfs: String,
    #[serde(rename = "fileFromBase64")]
    pub file_from_base64: String,
    #[serde(rename = "metadataPlaceholderName")]
    pub metadata_placeholder_name: String,
    #[serde(rename = "metadataPlaceholderValue")]
    pub metadata_placeholder_value: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadRequest<'a> {
    tokenname: &'a str,
    displayname: &'a str,
    description: &'a str,
    #[serde(rename = "previewImageNft")]
    preview_image_nft: PreviewImage<'a>,
    #[serde(rename = "metadataPlaceholder")]
    metadata_placeholder: Vec<MetadataPlaceholder<'a>>,
}

#[derive(Debug, Serialize)]
struct PreviewImage<'a> {
    mimetype: &'a str,
    #[serde(rename = "fileFromIPFS")]
    file_from_ipfs: &'a str,
    #[serde(rename = "fileFromBase64")]
    file_from_base64: &'a str,
}

#[derive(Debug, Serialize)]
struct MetadataPlaceholder<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> From<&'a TokenInput> for UploadRequest<'a> {
    fn from(input: &'a TokenInput) -> Self {
        Self {
            tokenname: &input.tokenname,
            displayname: &input.displayname,
            description: &input.description,
            preview_image_nft: PreviewImage {
                // Upstream ignores the value but requires the field.
                mimetype: "string",
                file_from_ipfs: &input.file_from_ipfs,
                file_from_base64: &input.file_from_base64,
            },
            metadata_placeholder: vec![MetadataPlaceholder {
                name: &input.metadata_placeholder_name,
                value: &input.metadata_placeholder_value,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_input_uses_client_field_names() {
        let input: TokenInput = serde_json::from_value(json!({
            "tokenname": "boom-1",
            "bearer": "Bearer abc",
            "fileFromIPFS": "ipfs://Qm123",
            "metadataPlaceholderName": "rarity",
            "metadataPlaceholderValue": "legendary"
        }))
        .unwrap();

        assert_eq!(input.tokenname, "boom-1");
        assert_eq!(input.bearer, "Bearer abc");
        assert_eq!(input.file_from_ipfs, "ipfs://Qm123");
        assert_eq!(input.metadata_placeholder_name, "rarity");
        assert_eq!(input.metadata_placeholder_value, "legendary");
        assert!(input.displayname.is_empty());
    }

    #[test]
    fn test_upload_request_shape() {
        let input = TokenInput {
            tokenname: "boom-1".into(),
            bearer: "secret".into(),
            displayname: "Boom #1".into(),
            description: "first".into(),
            file_from_ipfs: "ipfs://Qm123".into(),
            file_from_base64: String::new(),
            metadata_placeholder_name: "rarity".into(),
            metadata_placeholder_value: "legendary".into(),
        };

        let body = serde_json::to_value(UploadRequest::from(&input)).unwrap();
        assert_eq!(
            body,
            json!({
                "tokenname": "boom-1",
                "displayname": "Boom #1",
                "description": "first",
                "previewImageNft": {
                    "mimetype": "string",
                    "fileFromIPFS": "ipfs://Qm123",
                    "fileFromBase64": ""
                },
                "metadataPlaceholder": [{"name": "rarity", "value": "legendary"}]
            })
        );
        assert!(body.get("bearer").is_none());
    }
}

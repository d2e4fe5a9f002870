//! # Asset State
//!
//! NFT classes, assets and ICS-721 class traces as read from a chain.

use gv_01_channel_flow::{class_hash, ibc_class_id};
use serde::{Deserialize, Serialize};

/// An NFT class (denom, collection or CW-721 contract).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetClass {
    /// Class id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Metadata schema.
    pub schema: String,
    /// Creator address.
    pub creator: String,
    /// Metadata uri.
    pub uri: String,
    /// Hash of the uri content.
    pub uri_hash: String,
    /// Arbitrary class data.
    pub data: String,
}

/// One NFT.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    /// Class the asset belongs to.
    pub class_id: String,
    /// Token id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Metadata uri.
    pub uri: String,
    /// Hash of the uri content.
    pub uri_hash: String,
    /// Arbitrary token data.
    pub data: String,
    /// Current owner.
    pub owner: String,
}

/// Provenance of an `ibc/...` class id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassTrace {
    /// `port/channel` segments, most recent hop first, without trailing `/`.
    pub path: String,
    /// Class id on the origin chain.
    pub base_class_id: String,
}

impl ClassTrace {
    /// Create a class trace.
    pub fn new(path: impl Into<String>, base_class_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base_class_id: base_class_id.into(),
        }
    }

    /// `path/base_class_id`, or the base id alone for a native class.
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.base_class_id.clone()
        } else {
            format!("{}/{}", self.path, self.base_class_id)
        }
    }

    /// The `ibc/<HEX>` id this trace hashes to.
    pub fn ibc_class_id(&self) -> String {
        let prefix = if self.path.is_empty() {
            String::new()
        } else {
            format!("{}/", self.path)
        };
        ibc_class_id(&class_hash(&prefix, &self.base_class_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path() {
        let trace = ClassTrace::new("nft-transfer/channel-3", "gonClass");
        assert_eq!(trace.full_path(), "nft-transfer/channel-3/gonClass");
        assert_eq!(ClassTrace::new("", "gonClass").full_path(), "gonClass");
    }

    #[test]
    fn test_ibc_class_id_matches_trace_hash() {
        let trace = ClassTrace::new("nft-transfer/channel-3", "gonClass");
        let expected = ibc_class_id(&class_hash("nft-transfer/channel-3/", "gonClass"));
        assert_eq!(trace.ibc_class_id(), expected);
    }
}

//! # Transaction Responses
//!
//! The `result` object of a Tendermint `/tx` query, reduced to the fields
//! verification needs.
//!
//! Event attribute keys and values are base64 encoded by Tendermint before
//! 0.37 and plain text after; lookups accept both.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Event emitted by an outbound IBC packet.
pub const EVENT_SEND_PACKET: &str = "send_packet";
/// Event emitted when a packet is received.
pub const EVENT_RECV_PACKET: &str = "recv_packet";
/// Event emitted by the nft-transfer module when a new trace is created.
pub const EVENT_CLASS_TRACE: &str = "class_trace";
/// Event emitted by a native NFT transfer.
pub const EVENT_TRANSFER_NFT: &str = "transfer_nft";

/// Decoded `/tx` result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxResponse {
    /// Transaction hash (upper-case hex).
    pub hash: String,
    /// Block height, as a decimal string.
    pub height: String,
    /// Execution result.
    pub tx_result: TxResultBody,
}

/// Execution result of a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxResultBody {
    /// Result code; zero on success.
    pub code: u32,
    /// Raw log.
    pub log: String,
    /// Module codespace of a failure.
    pub codespace: String,
    /// Emitted events.
    pub events: Vec<TxEvent>,
}

/// One emitted event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attributes in emission order.
    pub attributes: Vec<EventAttribute>,
}

/// One event attribute, possibly base64 encoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAttribute {
    /// Key.
    pub key: String,
    /// Value.
    pub value: Option<String>,
    /// Whether the attribute is indexed.
    pub index: bool,
}

impl EventAttribute {
    /// Value of this attribute if its key is `key`, decoding base64 as needed.
    pub fn value_for(&self, key: &str) -> Option<String> {
        if self.key == key {
            return Some(self.value.clone().unwrap_or_default());
        }
        let decoded = STANDARD.decode(self.key.as_bytes()).ok()?;
        if decoded != key.as_bytes() {
            return None;
        }
        let raw = self.value.as_deref().unwrap_or_default();
        Some(
            STANDARD
                .decode(raw.as_bytes())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_else(|| raw.to_string()),
        )
    }
}

impl TxEvent {
    /// First value of `key` in this event.
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.iter().find_map(|a| a.value_for(key))
    }
}

/// ICS-721 packet payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NftPacketData {
    /// Class id, including any trace prefix on the sending side.
    pub class_id: String,
    /// Class uri.
    pub class_uri: String,
    /// Class data.
    pub class_data: String,
    /// Token ids being moved.
    pub token_ids: Vec<String>,
    /// Token uris.
    pub token_uris: Vec<String>,
    /// Token data.
    pub token_data: Vec<String>,
    /// Sender on the source chain.
    pub sender: String,
    /// Receiver on the destination chain.
    pub receiver: String,
    /// Free-form memo.
    pub memo: String,
}

/// Packet data together with its routing attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketEvent {
    /// Decoded payload.
    pub data: NftPacketData,
    /// Source port.
    pub src_port: String,
    /// Source channel.
    pub src_channel: String,
    /// Destination port.
    pub dest_port: String,
    /// Destination channel.
    pub dest_channel: String,
}

impl TxResponse {
    /// Build a response by hand.
    pub fn new(height: u64, code: u32) -> Self {
        Self {
            hash: String::new(),
            height: height.to_string(),
            tx_result: TxResultBody {
                code,
                ..Default::default()
            },
        }
    }

    /// Append an event with plain-text attributes.
    pub fn with_event(mut self, kind: &str, attributes: &[(&str, &str)]) -> Self {
        self.tx_result.events.push(TxEvent {
            kind: kind.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| EventAttribute {
                    key: k.to_string(),
                    value: Some(v.to_string()),
                    index: true,
                })
                .collect(),
        });
        self
    }

    /// Append an event with base64-encoded attributes.
    pub fn with_encoded_event(mut self, kind: &str, attributes: &[(&str, &str)]) -> Self {
        self.tx_result.events.push(TxEvent {
            kind: kind.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| EventAttribute {
                    key: STANDARD.encode(k),
                    value: Some(STANDARD.encode(v)),
                    index: true,
                })
                .collect(),
        });
        self
    }

    /// Result code.
    pub fn code(&self) -> u32 {
        self.tx_result.code
    }

    /// Block height string.
    pub fn height(&self) -> &str {
        &self.height
    }

    /// Events of the given type.
    pub fn events<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a TxEvent> + 'a {
        self.tx_result.events.iter().filter(move |e| e.kind == kind)
    }

    /// True if an event of the given type was emitted.
    pub fn has_event(&self, kind: &str) -> bool {
        self.events(kind).next().is_some()
    }

    /// First value of `key` in any event.
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.tx_result.events.iter().find_map(|e| e.attribute(key))
    }

    /// First value of `key` in an event of type `kind`.
    pub fn event_attribute(&self, kind: &str, key: &str) -> Option<String> {
        self.events(kind).find_map(|e| e.attribute(key))
    }

    /// The outbound packet, if one was sent.
    pub fn send_packet(&self) -> Result<PacketEvent, String> {
        self.packet(EVENT_SEND_PACKET)
    }

    /// The inbound packet, if one was received.
    pub fn recv_packet(&self) -> Result<PacketEvent, String> {
        self.packet(EVENT_RECV_PACKET)
    }

    /// `(trace_hash, class_id)` of a newly created class trace.
    pub fn class_trace(&self) -> Option<(String, String)> {
        let event = self.events(EVENT_CLASS_TRACE).next()?;
        Some((event.attribute("trace_hash")?, event.attribute("class_id")?))
    }

    fn packet(&self, kind: &str) -> Result<PacketEvent, String> {
        let event = self
            .events(kind)
            .next()
            .ok_or_else(|| format!("no {kind} event"))?;
        let raw = event
            .attribute("packet_data")
            .ok_or_else(|| format!("{kind} without packet_data"))?;
        let data: NftPacketData =
            serde_json::from_str(&raw).map_err(|e| format!("packet_data: {e}"))?;
        let field = |key: &str| event.attribute(key).unwrap_or_default();
        Ok(PacketEvent {
            data,
            src_port: field("packet_src_port"),
            src_channel: field("packet_src_channel"),
            dest_port: field("packet_dst_port"),
            dest_channel: field("packet_dst_channel"),
        })
    }
}

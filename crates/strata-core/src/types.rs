//! Mirrored document types for the cache store.
//!
//! Block and transaction documents decode directly from the node's verbose
//! JSON-RPC responses (serde) and persist with bincode. Ledger totals on
//! [`AddressDoc`] are integer satoshi-equivalent units.

use serde::{Deserialize, Serialize};

/// A mirrored block, keyed by hash and uniquely indexed by height.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct BlockDoc {
    pub hash: String,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub merkleroot: String,
    /// Ordered transaction ids.
    #[serde(default)]
    pub tx: Vec<String>,
    /// Full transaction bodies, populated during ingestion.
    #[serde(default)]
    pub fulltx: Vec<TxDoc>,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub mediantime: u64,
    #[serde(default)]
    pub bits: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub chainwork: String,
    #[serde(default)]
    pub previousblockhash: Option<String>,
    #[serde(default)]
    pub nextblockhash: Option<String>,
}

/// A full transaction body as returned by verbose `getrawtransaction`.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct TxDoc {
    pub txid: String,
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub vin: Vec<VinDoc>,
    #[serde(default)]
    pub vout: Vec<VoutDoc>,
}

impl TxDoc {
    /// True if any input is the synthetic newly-minted-supply input.
    pub fn has_coinbase_input(&self) -> bool {
        self.vin.iter().any(|v| v.coinbase.is_some())
    }
}

/// A transaction input referencing a previously created output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct VinDoc {
    /// Present only on the coinbase input of a block's first transaction.
    #[serde(default)]
    pub coinbase: Option<String>,
    /// Id of the transaction whose output is being spent.
    #[serde(default)]
    pub txid: Option<String>,
    /// Output index within that transaction.
    #[serde(default)]
    pub vout: Option<u32>,
}

/// A transaction output assigning value to a script.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct VoutDoc {
    /// Value in decimal coin units, as the node reports it.
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub n: u32,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: ScriptPubKey,
}

/// Script classification and destination addresses of an output.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct ScriptPubKey {
    #[serde(rename = "type", default)]
    pub script_type: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Direction of a ledger movement from the address's point of view.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The address spent value (appeared in an input).
    Vin,
    /// The address received value (appeared in an output).
    Vout,
}

/// A bounded reference to a transaction that touched an address.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxRef {
    pub txid: String,
    pub direction: Direction,
}

/// Per-address balance ledger entry. Created lazily, never deleted.
///
/// Invariant: `balance == received - sent`, except the coinbase
/// pseudo-address whose balance is pinned at zero.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AddressDoc {
    pub a_id: String,
    pub received: u64,
    pub sent: u64,
    pub balance: u64,
    /// Most-recent transaction references, oldest evicted first.
    pub txs: Vec<TxRef>,
}

/// Slim ranking entry embedded in the rich-list snapshot.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq,
    bincode::Encode, bincode::Decode,
)]
pub struct RankedAddress {
    pub a_id: String,
    pub received: u64,
    pub sent: u64,
    pub balance: u64,
}

impl From<&AddressDoc> for RankedAddress {
    fn from(doc: &AddressDoc) -> Self {
        Self {
            a_id: doc.a_id.clone(),
            received: doc.received,
            sent: doc.sent,
            balance: doc.balance,
        }
    }
}

/// Per-coin rich-list snapshot, replaced wholesale on recomputation.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct RichlistDoc {
    pub coin: String,
    /// Top addresses ranked by lifetime received.
    pub received: Vec<RankedAddress>,
    /// Top addresses ranked by current balance.
    pub balance: Vec<RankedAddress>,
}

impl RichlistDoc {
    pub fn empty(coin: &str) -> Self {
        Self { coin: coin.to_owned(), ..Self::default() }
    }
}

/// Aggregated chain statistics snapshot, replaced wholesale per refresh.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct StatsDoc {
    pub coin: String,
    /// Node's current block height.
    pub blocks: u64,
    pub difficulty: f64,
    pub networkhashps: f64,
    /// Mempool transaction count.
    pub pooledtx: u64,
    /// Total supply in decimal coin units.
    pub supply: f64,
    pub connections: u64,
    pub bestblock: String,
    pub transactions: u64,
    pub txouts: u64,
    pub chain: String,
    pub warnings: String,
}

impl StatsDoc {
    pub fn new(coin: &str) -> Self {
        Self { coin: coin.to_owned(), ..Self::default() }
    }
}

/// Ephemeral mirror of one node peer-table row.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct PeerDoc {
    #[serde(alias = "addr")]
    pub address: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub subver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_decodes_from_node_json() {
        let raw = serde_json::json!({
            "hash": "00aa",
            "height": 7,
            "size": 215,
            "weight": 860,
            "version": 536870912,
            "merkleroot": "beef",
            "tx": ["t1", "t2"],
            "time": 1700000000u64,
            "difficulty": 1.5,
            "chainwork": "0001",
            "previousblockhash": "0099",
            "confirmations": 12
        });
        let block: BlockDoc = serde_json::from_value(raw).unwrap();
        assert_eq!(block.height, 7);
        assert_eq!(block.tx, vec!["t1", "t2"]);
        assert!(block.fulltx.is_empty());
        assert_eq!(block.nextblockhash, None);
    }

    #[test]
    fn tx_decodes_with_script_rename() {
        let raw = serde_json::json!({
            "txid": "t1",
            "vin": [{ "coinbase": "04ffff" }],
            "vout": [{
                "value": 50.0,
                "n": 0,
                "scriptPubKey": { "type": "pubkeyhash", "addresses": ["addr1"] }
            }]
        });
        let tx: TxDoc = serde_json::from_value(raw).unwrap();
        assert!(tx.has_coinbase_input());
        assert_eq!(tx.vout[0].script_pub_key.addresses, vec!["addr1"]);
    }

    #[test]
    fn address_doc_bincode_round_trip() {
        let doc = AddressDoc {
            a_id: "addr1".into(),
            received: 500,
            sent: 200,
            balance: 300,
            txs: vec![TxRef { txid: "t1".into(), direction: Direction::Vout }],
        };
        let bytes = bincode::encode_to_vec(&doc, bincode::config::standard()).unwrap();
        let (back, _): (AddressDoc, _) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn peer_accepts_addr_alias() {
        let peer: PeerDoc =
            serde_json::from_value(serde_json::json!({ "addr": "1.2.3.4:9333", "version": 70015u64 }))
                .unwrap();
        assert_eq!(peer.address, "1.2.3.4:9333");
    }
}

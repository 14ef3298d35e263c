//! Transaction decomposition.
//!
//! Turns a raw transaction's inputs and outputs into address-level
//! credit/debit records. Outputs are grouped by destination address;
//! inputs are resolved to the outputs they spend via one upstream lookup
//! of each referenced prior transaction. A transaction with a coinbase
//! input gets a single synthesized "coinbase" pseudo-input whose amount
//! is the newly minted value.

use strata_core::amount::to_sats;
use strata_core::constants::{COINBASE_ADDRESS, NONSTANDARD_SCRIPT, NULLDATA_SCRIPT};
use strata_core::traits::NodeClient;
use strata_core::types::{TxDoc, VoutDoc};
use tracing::debug;

/// One address-level movement, in satoshi-equivalent units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressAmount {
    pub address: String,
    pub amount: u64,
}

/// A transaction decomposed into per-address spends and receipts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposed {
    /// Resolved spends, deduplicated by address.
    pub vin: Vec<AddressAmount>,
    /// Grouped receipts, deduplicated by address.
    pub vout: Vec<AddressAmount>,
    /// Total output value.
    pub total: u64,
}

/// Decompose a transaction into address-level records.
pub async fn decompose(node: &dyn NodeClient, tx: &TxDoc) -> Decomposed {
    let mut vin = resolve_inputs(node, tx).await;
    let mut vout = group_outputs(&tx.vout);

    // A non-standard first output that mirrors the first resolved input is
    // an internal change artifact: fold it back instead of listing it.
    if let Some(first) = tx.vout.first() {
        if first.script_pub_key.script_type == NONSTANDARD_SCRIPT
            && !vin.is_empty()
            && !vout.is_empty()
            && vin[0].address == vout[0].address
        {
            vout[0].amount = vout[0].amount.saturating_sub(vin[0].amount);
            vin.remove(0);
        }
    }

    if tx.has_coinbase_input() {
        let total_out: u64 = tx.vout.iter().map(|v| to_sats(v.value)).sum();
        let resolved: u64 = vin.iter().map(|v| v.amount).sum();
        vin.push(AddressAmount {
            address: COINBASE_ADDRESS.to_owned(),
            amount: total_out.saturating_sub(resolved),
        });
    }

    let total = vout.iter().map(|v| v.amount).sum();
    Decomposed { vin, vout, total }
}

/// Group spendable outputs by destination address, summing amounts for
/// duplicate addresses within the transaction.
fn group_outputs(vout: &[VoutDoc]) -> Vec<AddressAmount> {
    let mut grouped: Vec<AddressAmount> = Vec::new();
    for out in vout {
        let script = &out.script_pub_key;
        if script.script_type == NONSTANDARD_SCRIPT || script.script_type == NULLDATA_SCRIPT {
            continue;
        }
        let Some(address) = script.addresses.first() else {
            continue;
        };
        let amount = to_sats(out.value);
        match grouped.iter_mut().find(|g| g.address == *address) {
            Some(existing) => existing.amount += amount,
            None => grouped.push(AddressAmount { address: address.clone(), amount }),
        }
    }
    grouped
}

/// Resolve each non-coinbase input to the output it spends.
///
/// A failed upstream lookup degrades the whole input set to empty rather
/// than faulting; the caller logs and moves on.
async fn resolve_inputs(node: &dyn NodeClient, tx: &TxDoc) -> Vec<AddressAmount> {
    let mut resolved: Vec<AddressAmount> = Vec::new();
    for vin in &tx.vin {
        if vin.coinbase.is_some() {
            continue;
        }
        let (Some(prev_txid), Some(prev_index)) = (&vin.txid, vin.vout) else {
            continue;
        };
        let prev = match node.get_raw_transaction(prev_txid).await {
            Ok(prev) => prev,
            Err(e) => {
                debug!(txid = %tx.txid, prev_txid = %prev_txid, error = %e,
                       "input resolution failed, dropping inputs");
                return Vec::new();
            }
        };
        let Some(spent) = prev
            .vout
            .iter()
            .find(|out| out.n == prev_index && !out.script_pub_key.addresses.is_empty())
        else {
            continue;
        };
        let address = spent.script_pub_key.addresses.join("\n");
        let amount = to_sats(spent.value);
        match resolved.iter_mut().find(|r| r.address == address) {
            Some(existing) => existing.amount += amount,
            None => resolved.push(AddressAmount { address, amount }),
        }
    }
    resolved
}

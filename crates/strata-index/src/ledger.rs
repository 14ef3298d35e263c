//! Per-address balance ledger updates.
//!
//! Applies decomposed spend/receipt records to [`AddressDoc`]s. Duplicate
//! application is detected by the composite key (address, txid, direction):
//! a same-direction duplicate is a no-op, a differing-direction duplicate
//! updates totals but suppresses a second reference insertion. The
//! coinbase pseudo-address accumulates only `sent` and its balance is
//! pinned at zero.

use strata_core::constants::COINBASE_ADDRESS;
use strata_core::error::StoreError;
use strata_core::types::{AddressDoc, Direction, TxRef};
use strata_store::CacheStore;

use crate::decompose::Decomposed;

/// Applies decomposed records to address ledger entries in the store.
pub struct LedgerUpdater<'a> {
    store: &'a CacheStore,
    tx_ref_cap: usize,
}

impl<'a> LedgerUpdater<'a> {
    pub fn new(store: &'a CacheStore, tx_ref_cap: usize) -> Self {
        Self { store, tx_ref_cap }
    }

    /// Apply one decomposed transaction: every resolved input as a spend,
    /// every grouped output as a receipt.
    pub fn apply(&self, txid: &str, record: &Decomposed) -> Result<(), StoreError> {
        for vin in &record.vin {
            self.apply_one(&vin.address, txid, vin.amount, Direction::Vin)?;
        }
        for vout in &record.vout {
            self.apply_one(&vout.address, txid, vout.amount, Direction::Vout)?;
        }
        Ok(())
    }

    fn apply_one(
        &self,
        address: &str,
        txid: &str,
        amount: u64,
        direction: Direction,
    ) -> Result<(), StoreError> {
        if address == COINBASE_ADDRESS {
            return self.apply_coinbase(txid, amount, direction);
        }

        let Some(mut doc) = self.store.address(address)? else {
            let (received, sent) = match direction {
                Direction::Vin => (0, amount),
                Direction::Vout => (amount, 0),
            };
            let doc = AddressDoc {
                a_id: address.to_owned(),
                received,
                sent,
                balance: received.saturating_sub(sent),
                txs: vec![TxRef { txid: txid.to_owned(), direction }],
            };
            return self.store.put_address(&doc);
        };

        match doc.txs.iter().position(|r| r.txid == txid) {
            Some(i) if doc.txs[i].direction == direction => {
                // Already applied with this direction.
                return Ok(());
            }
            Some(_) => {
                // Same transaction, other direction: totals move but the
                // reference ring keeps a single entry.
            }
            None => {
                doc.txs.push(TxRef { txid: txid.to_owned(), direction });
                if doc.txs.len() > self.tx_ref_cap {
                    doc.txs.remove(0);
                }
            }
        }

        match direction {
            Direction::Vin => doc.sent += amount,
            Direction::Vout => doc.received += amount,
        }
        doc.balance = doc.received.saturating_sub(doc.sent);
        self.store.put_address(&doc)
    }

    /// The coinbase pseudo-address only ever tracks newly minted supply.
    fn apply_coinbase(
        &self,
        txid: &str,
        amount: u64,
        direction: Direction,
    ) -> Result<(), StoreError> {
        if direction != Direction::Vin {
            return Ok(());
        }
        let mut doc = self
            .store
            .address(COINBASE_ADDRESS)?
            .unwrap_or_else(|| AddressDoc { a_id: COINBASE_ADDRESS.to_owned(), ..AddressDoc::default() });
        if doc.txs.iter().any(|r| r.txid == txid && r.direction == direction) {
            return Ok(());
        }
        doc.txs.push(TxRef { txid: txid.to_owned(), direction });
        if doc.txs.len() > self.tx_ref_cap {
            doc.txs.remove(0);
        }
        doc.sent += amount;
        doc.balance = 0;
        self.store.put_address(&doc)
    }
}

use anyhow::Result;
use ssz::Decode as _;
use types::containers::{BeaconBlock, BlobSidecars};

use crate::errors::Error;

/// Proposal tx slots are fixed: the block always rides in tx 0, its
/// sidecars in tx 1.
pub const BEACON_BLOCK_TX_INDEX: usize = 0;
pub const BLOB_SIDECARS_TX_INDEX: usize = 1;

pub fn extract_beacon_block(txs: &[Vec<u8>], index: usize) -> Result<BeaconBlock> {
    let bytes = tx_bytes(txs, index)?;
    BeaconBlock::from_ssz_bytes(bytes).map_err(|_| Error::InvalidBlockBytes.into())
}

pub fn extract_blob_sidecars(txs: &[Vec<u8>], index: usize) -> Result<BlobSidecars> {
    let bytes = tx_bytes(txs, index)?;
    BlobSidecars::from_ssz_bytes(bytes).map_err(|_| Error::InvalidSidecarBytes.into())
}

fn tx_bytes(txs: &[Vec<u8>], index: usize) -> Result<&[u8]> {
    if txs.is_empty() {
        return Err(Error::NoBlockInRequest.into());
    }

    if index >= txs.len() {
        return Err(Error::IndexOutOfBounds {
            index,
            len: txs.len(),
        }
        .into());
    }

    let bytes = txs[index].as_slice();

    if bytes.is_empty() {
        return Err(Error::NoBlockInRequest.into());
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use ssz::Encode as _;

    use super::*;

    #[test]
    fn blocks_round_trip_through_tx_zero() {
        let block = BeaconBlock {
            slot: 3,
            ..BeaconBlock::default()
        };

        let txs = vec![block.as_ssz_bytes(), BlobSidecars::default().as_ssz_bytes()];

        assert_eq!(
            extract_beacon_block(&txs, BEACON_BLOCK_TX_INDEX).unwrap(),
            block,
        );
    }

    #[test]
    fn missing_and_out_of_range_txs_are_reported() {
        let no_txs: Vec<Vec<u8>> = vec![];

        let error = extract_beacon_block(&no_txs, 0)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();
        assert_eq!(error, Error::NoBlockInRequest);

        let one_tx = vec![BeaconBlock::default().as_ssz_bytes()];

        let error = extract_blob_sidecars(&one_tx, BLOB_SIDECARS_TX_INDEX)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();
        assert_eq!(error, Error::IndexOutOfBounds { index: 1, len: 1 });
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        let txs = vec![vec![1, 2, 3]];

        let error = extract_beacon_block(&txs, 0)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(error, Error::InvalidBlockBytes);
    }
}

use std::sync::Mutex;

use anyhow::{ensure, Result};
use ssz::{Decode as _, Encode as _};
use types::{containers::Deposit, primitives::DepositIndex};

use crate::{db::Database, error::Error};

/// The gapless deposit queue fed by the execution layer.
pub struct DepositStore {
    db: Database,
    next_index: Mutex<DepositIndex>,
}

impl DepositStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db,
            next_index: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn next_index(&self) -> DepositIndex {
        *self
            .next_index
            .lock()
            .expect("deposit store mutex is poisoned")
    }

    /// Accepts `deposits` iff they continue the queue without a gap.
    pub fn enqueue_deposits(&self, deposits: &[Deposit]) -> Result<()> {
        let mut next = self
            .next_index
            .lock()
            .expect("deposit store mutex is poisoned");

        let mut expected = *next;
        let mut pairs = Vec::with_capacity(deposits.len());

        for deposit in deposits {
            ensure!(
                deposit.index == expected,
                Error::DepositIndexGap {
                    expected,
                    actual: deposit.index,
                },
            );

            pairs.push((deposit.index.to_be_bytes(), deposit.as_ssz_bytes()));
            expected += 1;
        }

        self.db.put_batch(pairs)?;
        *next = expected;

        Ok(())
    }

    /// Exactly `count` deposits starting at `start`, or an error naming
    /// the first missing index.
    pub fn get_deposits_by_index(
        &self,
        start: DepositIndex,
        count: u64,
    ) -> Result<Vec<Deposit>> {
        let mut deposits = Vec::with_capacity(count as usize);

        for index in start..start + count {
            let bytes = self
                .db
                .get(index.to_be_bytes())?
                .ok_or(Error::MissingDeposit { index })?;

            let deposit = Deposit::from_ssz_bytes(&bytes)
                .map_err(|_| Error::CorruptValue { what: "deposit" })?;

            deposits.push(deposit);
        }

        Ok(deposits)
    }

    pub fn prune(&self, start: DepositIndex, end: DepositIndex) -> Result<()> {
        self.db
            .delete_range(start.to_be_bytes().to_vec()..end.to_be_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(index: DepositIndex) -> Deposit {
        Deposit {
            index,
            amount: 32_000_000_000,
            ..Deposit::default()
        }
    }

    #[test]
    fn the_queue_accepts_contiguous_batches() -> Result<()> {
        let store = DepositStore::new(Database::in_memory());

        store.enqueue_deposits(&[deposit(0), deposit(1)])?;
        store.enqueue_deposits(&[deposit(2)])?;

        assert_eq!(store.next_index(), 3);
        assert_eq!(store.get_deposits_by_index(0, 3)?.len(), 3);

        Ok(())
    }

    #[test]
    fn a_gap_is_rejected_and_nothing_is_written() {
        let store = DepositStore::new(Database::in_memory());

        let error = store
            .enqueue_deposits(&[deposit(0), deposit(2)])
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(
            error,
            Error::DepositIndexGap {
                expected: 1,
                actual: 2,
            },
        );

        assert_eq!(store.next_index(), 0);
        assert!(store.get_deposits_by_index(0, 1).is_err());
    }

    #[test]
    fn reads_are_exact_or_fail() -> Result<()> {
        let store = DepositStore::new(Database::in_memory());
        store.enqueue_deposits(&[deposit(0), deposit(1)])?;

        assert_eq!(store.get_deposits_by_index(0, 2)?.len(), 2);

        let error = store
            .get_deposits_by_index(1, 2)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(error, Error::MissingDeposit { index: 2 });

        Ok(())
    }

    #[test]
    fn pruning_drops_the_consumed_prefix() -> Result<()> {
        let store = DepositStore::new(Database::in_memory());
        store.enqueue_deposits(&[deposit(0), deposit(1), deposit(2)])?;

        store.prune(0, 2)?;

        assert!(store.get_deposits_by_index(0, 1).is_err());
        assert_eq!(store.get_deposits_by_index(2, 1)?.len(), 1);
        assert_eq!(store.next_index(), 3);

        Ok(())
    }
}

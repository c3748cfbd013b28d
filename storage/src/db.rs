use core::ops::Range;
use std::sync::Mutex;

use anyhow::Result;
use im::OrdMap;
use snap::raw::{Decoder, Encoder};

/// Snapshot-isolated key-value storage.
///
/// Values are snappy-compressed. Writes go through a whole-map swap, so a
/// batch is either fully visible or not at all.
pub struct Database {
    map: Mutex<OrdMap<Vec<u8>, Vec<u8>>>,
}

impl Database {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            map: Mutex::default(),
        }
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.map
            .lock()
            .expect("database mutex is poisoned")
            .get(key.as_ref())
            .map(|compressed| decompress(compressed))
            .transpose()
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        Ok(self
            .map
            .lock()
            .expect("database mutex is poisoned")
            .contains_key(key.as_ref()))
    }

    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        self.put_batch(core::iter::once((key, value)))
    }

    pub fn put_batch(
        &self,
        pairs: impl IntoIterator<Item = (impl AsRef<[u8]>, impl AsRef<[u8]>)>,
    ) -> Result<()> {
        let mut staged = vec![];

        for (key, value) in pairs {
            staged.push((key.as_ref().to_vec(), compress(value.as_ref())?));
        }

        let mut map = self.map.lock().expect("database mutex is poisoned");
        let mut new_map = map.clone();

        for (key, value) in staged {
            new_map.insert(key, value);
        }

        *map = new_map;

        Ok(())
    }

    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.map
            .lock()
            .expect("database mutex is poisoned")
            .remove(key.as_ref());

        Ok(())
    }

    pub fn delete_range(&self, range: Range<impl AsRef<[u8]>>) -> Result<()> {
        let start = range.start.as_ref();
        let end = range.end.as_ref();

        let mut map = self.map.lock().expect("database mutex is poisoned");

        let doomed = map
            .range(start.to_vec()..end.to_vec())
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();

        let mut new_map = map.clone();

        for key in &doomed {
            new_map.remove(key);
        }

        *map = new_map;

        Ok(())
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    Encoder::new().compress_vec(data).map_err(Into::into)
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    Decoder::new().decompress_vec(data).map_err(Into::into)
}

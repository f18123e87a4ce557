//! Persistence gateway over the embedded document store.
//!
//! Collections map to sled trees; documents are minicbor-encoded.
//! Single-document read-after-write consistency comes from sled
//! itself. `swap` exposes the compare-and-swap primitive the lifecycle
//! engine serializes transitions with.
use crate::error::PfmsError;
use crate::utils;
use std::sync::Arc;

#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<sled::Db>,
}

impl DocumentStore {
    pub fn new(db: Arc<sled::Db>) -> Self {
        Self { db }
    }

    fn tree(&self, collection: &str) -> anyhow::Result<sled::Tree> {
        Ok(self.db.open_tree(collection)?)
    }

    /// Store a record under a gateway-assigned id and return the id.
    pub fn create<T: minicbor::Encode<()>>(
        &self,
        collection: &str,
        record: &T,
    ) -> anyhow::Result<String> {
        let id = utils::new_uuid_to_bech32("doc_")?;
        self.insert(collection, &id, record)?;
        Ok(id)
    }

    /// Store a record under a caller-assigned id.
    pub fn insert<T: minicbor::Encode<()>>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> anyhow::Result<()> {
        let tree = self.tree(collection)?;
        tree.insert(id.as_bytes(), minicbor::to_vec(record)?)?;
        Ok(())
    }

    pub fn get<T>(&self, collection: &str, id: &str) -> anyhow::Result<T>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        Ok(self.get_raw(collection, id)?.1)
    }

    /// Fetch a document together with its stored bytes, for use as the
    /// expected value in a later `swap`.
    pub fn get_raw<T>(&self, collection: &str, id: &str) -> anyhow::Result<(sled::IVec, T)>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        let tree = self.tree(collection)?;
        let Some(bytes) = tree.get(id.as_bytes())? else {
            return Err(PfmsError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
            .into());
        };
        let record = minicbor::decode(&bytes)?;
        Ok((bytes, record))
    }

    pub fn list<T>(&self, collection: &str) -> anyhow::Result<Vec<T>>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        let tree = self.tree(collection)?;
        let mut records = Vec::new();
        for entry in tree.iter() {
            let (_, bytes) = entry?;
            records.push(minicbor::decode(&bytes)?);
        }
        Ok(records)
    }

    /// Full-document overwrite of an existing record.
    pub fn update<T: minicbor::Encode<()>>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> anyhow::Result<()> {
        let tree = self.tree(collection)?;
        if tree.get(id.as_bytes())?.is_none() {
            return Err(PfmsError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        tree.insert(id.as_bytes(), minicbor::to_vec(record)?)?;
        Ok(())
    }

    /// Write `record` only if the stored bytes still equal `expected`.
    /// Returns false when another writer got there first.
    pub fn swap<T: minicbor::Encode<()>>(
        &self,
        collection: &str,
        id: &str,
        expected: &sled::IVec,
        record: &T,
    ) -> anyhow::Result<bool> {
        let tree = self.tree(collection)?;
        let outcome = tree.compare_and_swap(
            id.as_bytes(),
            Some(expected),
            Some(minicbor::to_vec(record)?),
        )?;
        Ok(outcome.is_ok())
    }
}

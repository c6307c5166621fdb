// src/store/batch.rs

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Writes staged by the set operations and committed atomically by the caller.
///
/// Ops are applied in staging order, so a later op on the same key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

impl From<WriteBatch> for sled::Batch {
    fn from(batch: WriteBatch) -> Self {
        let mut out = sled::Batch::default();
        for op in batch.ops {
            match op {
                BatchOp::Put { key, value } => out.insert(key, value),
                BatchOp::Delete { key } => out.remove(key),
            }
        }
        out
    }
}

// src/engine/mod.rs

//! # Engine
//!
//! The `engine` module is the command layer of the server. It:
//! - receives a parsed command (`Vec<Vec<u8>>`) from the network layer;
//! - checks arity and dispatches to the set operations in [`crate::types`];
//! - for writes, takes the per-key lock, stages into a fresh [`WriteBatch`]
//!   and commits it while the lock is still held;
//! - turns results and errors into a [`Reply`].
//!
//! Commands touching several keys (`DEL k1 k2`) handle each key on its own;
//! there is no cross-key atomicity. `DEL` stops at the first key it cannot
//! delete (one holding another type): keys before it stay deleted, keys after
//! it are untouched, and the client only sees the error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::lock::{KeyGuard, KeyLocks};
use crate::monitor::Metrics;
use crate::protocol::Reply;
use crate::store::{KvStore, WriteBatch};
use crate::types::{self, set};

pub struct Engine<S: KvStore> {
    store: S,
    locks: KeyLocks,
    metrics: Arc<Metrics>,
}

impl<S: KvStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self::with_parts(store, KeyLocks::default(), Arc::new(Metrics::new()))
    }

    pub fn with_parts(store: S, locks: KeyLocks, metrics: Arc<Metrics>) -> Self {
        Engine { store, locks, metrics }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run `op` under the lock for `key` and commit whatever it staged.
    fn mutate<T, F>(&self, key: &[u8], op: F) -> Result<T>
    where
        F: FnOnce(&S, &KeyGuard<'_>, &mut WriteBatch) -> Result<T>,
    {
        let guard = self.locks.lock(key);
        let mut batch = WriteBatch::new();
        let out = op(&self.store, &guard, &mut batch)?;
        if !batch.is_empty() {
            debug!(key = %hex::encode(key), ops = batch.len(), "committing batch");
            self.store.commit(batch)?;
        }
        Ok(out)
    }

    /// Execute a single client command.
    ///
    /// # Arguments
    ///
    /// * `parts` - command name followed by its arguments
    pub fn execute(&self, parts: &[Vec<u8>]) -> Reply {
        let Some(name) = parts.first() else {
            return Reply::error("ERR empty command");
        };
        let cmd = String::from_utf8_lossy(name).to_ascii_uppercase();
        let args = &parts[1..];

        let result = match cmd.as_str() {
            // --- Connection / control commands ---
            "PING" => Ok(Reply::Simple("PONG".into())),
            "QUIT" => Ok(Reply::ok()),

            // --- Set commands ---
            "SADD" => {
                if args.len() < 2 {
                    return wrong_arity(&cmd);
                }
                self.mutate(&args[0], |db, g, b| set::sadd(db, g, &args[1..], b))
                    .map(|n| Reply::Integer(n.into()))
            }
            "SREM" => {
                if args.len() < 2 {
                    return wrong_arity(&cmd);
                }
                self.mutate(&args[0], |db, g, b| set::srem(db, g, &args[1..], b))
                    .map(|n| Reply::Integer(n.into()))
            }
            "SPOP" => {
                if args.len() != 1 {
                    return wrong_arity(&cmd);
                }
                self.mutate(&args[0], set::spop).map(Reply::Bulk)
            }
            "SCARD" => {
                if args.len() != 1 {
                    return wrong_arity(&cmd);
                }
                set::scard(&self.store, &args[0]).map(|n| Reply::Integer(n.into()))
            }
            "SISMEMBER" => {
                if args.len() != 2 {
                    return wrong_arity(&cmd);
                }
                set::sismember(&self.store, &args[0], &args[1])
                    .map(|found| Reply::Integer(found as i64))
            }
            "SMEMBERS" => {
                if args.len() != 1 {
                    return wrong_arity(&cmd);
                }
                set::smembers(&self.store, &args[0]).map(Reply::Array)
            }

            // --- Keyspace commands ---
            "DEL" => {
                if args.is_empty() {
                    return wrong_arity(&cmd);
                }
                self.del(args)
            }

            other => {
                return Reply::error(format!("ERR unknown command '{}'", other));
            }
        };

        self.metrics.record_command(&cmd);
        result.unwrap_or_else(|e| error_reply(&cmd, e))
    }

    /// Each key is committed as soon as it is staged.
    fn del(&self, keys: &[Vec<u8>]) -> Result<Reply> {
        let mut deleted = 0i64;
        for key in keys {
            if self.mutate(key, types::delete_key)? {
                deleted += 1;
            }
        }
        Ok(Reply::Integer(deleted))
    }
}

fn wrong_arity(cmd: &str) -> Reply {
    Reply::error(format!("ERR wrong number of arguments for '{}' command", cmd))
}

fn error_reply(cmd: &str, err: Error) -> Reply {
    match err {
        Error::WrongType => Reply::Error(err.to_string()),
        Error::StoreIo(_) | Error::CorruptData { .. } | Error::CardinalityOverflow => {
            warn!(command = cmd, error = %err, "command failed");
            Reply::Error(format!("ERR {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ReadView, SledStore};
    use crate::types::{ValueTag, meta_key};

    fn cmd(parts: &[&str]) -> Vec<Vec<u8>> {
        parts.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn members(reply: Reply) -> Vec<String> {
        match reply {
            Reply::Array(items) => items
                .into_iter()
                .map(|m| String::from_utf8(m).unwrap())
                .collect(),
            other => panic!("expected array, got {:?}", other),
        }
    }

    // 集合命令测试
    #[test]
    fn test_set_commands() {
        let engine = Engine::new(MemoryStore::new());

        assert_eq!(engine.execute(&cmd(&["SADD", "fruits", "apple", "pear"])), Reply::Integer(2));
        assert_eq!(engine.execute(&cmd(&["sadd", "fruits", "apple"])), Reply::Integer(0));
        assert_eq!(engine.execute(&cmd(&["SCARD", "fruits"])), Reply::Integer(2));
        assert_eq!(engine.execute(&cmd(&["SISMEMBER", "fruits", "pear"])), Reply::Integer(1));
        assert_eq!(engine.execute(&cmd(&["SISMEMBER", "fruits", "kiwi"])), Reply::Integer(0));
        assert_eq!(members(engine.execute(&cmd(&["SMEMBERS", "fruits"]))), vec!["apple", "pear"]);

        assert_eq!(engine.execute(&cmd(&["SREM", "fruits", "pear"])), Reply::Integer(1));
        assert_eq!(engine.execute(&cmd(&["SCARD", "fruits"])), Reply::Integer(1));

        assert_eq!(
            engine.execute(&cmd(&["SPOP", "fruits"])),
            Reply::Bulk(Some(b"apple".to_vec()))
        );
        assert_eq!(engine.execute(&cmd(&["SCARD", "fruits"])), Reply::Integer(0));
        assert_eq!(engine.execute(&cmd(&["SPOP", "fruits"])), Reply::Bulk(None));
        assert!(members(engine.execute(&cmd(&["SMEMBERS", "fruits"]))).is_empty());
        assert!(!engine.store().contains_key(&meta_key(b"fruits")).unwrap());

        let stats = engine.metrics().command_stats.get("SADD").map(|v| *v);
        assert_eq!(stats, Some(2));
    }

    #[test]
    fn test_del_command() {
        let engine = Engine::new(MemoryStore::new());
        engine.execute(&cmd(&["SADD", "a", "1", "2"]));
        engine.execute(&cmd(&["SADD", "b", "3"]));

        assert_eq!(engine.execute(&cmd(&["DEL", "a", "missing", "b"])), Reply::Integer(2));
        assert!(engine.store().is_empty());
        assert_eq!(engine.execute(&cmd(&["DEL", "a"])), Reply::Integer(0));
    }

    #[test]
    fn test_wrong_type_reply() {
        let engine = Engine::new(MemoryStore::new());
        let mut batch = WriteBatch::new();
        batch.put(meta_key(b"h"), vec![ValueTag::Hash as u8, 0, 0, 0, 1]);
        engine.store().commit(batch).unwrap();

        for parts in [
            cmd(&["SADD", "h", "x"]),
            cmd(&["SCARD", "h"]),
            cmd(&["SMEMBERS", "h"]),
            cmd(&["SPOP", "h"]),
            cmd(&["DEL", "h"]),
        ] {
            match engine.execute(&parts) {
                Reply::Error(e) => assert!(e.starts_with("WRONGTYPE"), "{}", e),
                other => panic!("expected WRONGTYPE, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_corrupt_metadata_reply() {
        let engine = Engine::new(MemoryStore::new());
        let mut batch = WriteBatch::new();
        batch.put(meta_key(b"s"), vec![ValueTag::SetCard as u8, 1]);
        engine.store().commit(batch).unwrap();

        match engine.execute(&cmd(&["SCARD", "s"])) {
            Reply::Error(e) => assert!(e.starts_with("ERR corrupt"), "{}", e),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_del_stops_at_foreign_key() {
        let engine = Engine::new(MemoryStore::new());
        engine.execute(&cmd(&["SADD", "a", "1"]));
        engine.execute(&cmd(&["SADD", "b", "2"]));
        let mut batch = WriteBatch::new();
        batch.put(meta_key(b"h"), vec![ValueTag::Hash as u8, 0, 0, 0, 1]);
        engine.store().commit(batch).unwrap();

        match engine.execute(&cmd(&["DEL", "a", "h", "b"])) {
            Reply::Error(e) => assert!(e.starts_with("WRONGTYPE"), "{}", e),
            other => panic!("expected WRONGTYPE, got {:?}", other),
        }
        // 已处理的 key 不回滚
        assert_eq!(engine.execute(&cmd(&["SCARD", "a"])), Reply::Integer(0));
        assert_eq!(engine.execute(&cmd(&["SCARD", "b"])), Reply::Integer(1));
        assert!(engine.store().contains_key(&meta_key(b"h")).unwrap());
    }

    #[test]
    fn test_cardinality_overflow_reply() {
        let engine = Engine::new(MemoryStore::new());
        let mut batch = WriteBatch::new();
        batch.put(meta_key(b"s"), set::card::encode(u32::MAX).to_vec());
        engine.store().commit(batch).unwrap();

        assert_eq!(
            engine.execute(&cmd(&["SADD", "s", "x"])),
            Reply::error("ERR set cardinality overflow")
        );
        assert_eq!(engine.execute(&cmd(&["SCARD", "s"])), Reply::Integer(u32::MAX.into()));
        assert_eq!(engine.execute(&cmd(&["SISMEMBER", "s", "x"])), Reply::Integer(0));
    }

    // 控制命令测试
    #[test]
    fn test_control_commands() {
        let engine = Engine::new(MemoryStore::new());
        assert_eq!(engine.execute(&cmd(&["PING"])), Reply::Simple("PONG".into()));
        assert_eq!(engine.execute(&cmd(&["QUIT"])), Reply::ok());
        assert_eq!(engine.execute(&[]), Reply::error("ERR empty command"));
    }

    // 错误参数测试
    #[test]
    fn test_argument_errors() {
        let engine = Engine::new(MemoryStore::new());
        assert_eq!(
            engine.execute(&cmd(&["SADD", "S"])),
            Reply::error("ERR wrong number of arguments for 'SADD' command")
        );
        assert_eq!(
            engine.execute(&cmd(&["SISMEMBER", "S"])),
            Reply::error("ERR wrong number of arguments for 'SISMEMBER' command")
        );
        assert_eq!(
            engine.execute(&cmd(&["SPOP", "S", "2"])),
            Reply::error("ERR wrong number of arguments for 'SPOP' command")
        );
        assert_eq!(
            engine.execute(&cmd(&["SUNION", "a", "b"])),
            Reply::error("ERR unknown command 'SUNION'")
        );
    }

    #[test]
    fn test_engine_on_sled() {
        let engine = Engine::new(SledStore::temporary().unwrap());
        assert_eq!(engine.execute(&cmd(&["SADD", "S", "x", "y", "x"])), Reply::Integer(2));
        assert_eq!(members(engine.execute(&cmd(&["SMEMBERS", "S"]))), vec!["x", "y"]);
        assert_eq!(engine.execute(&cmd(&["DEL", "S"])), Reply::Integer(1));
        assert_eq!(engine.execute(&cmd(&["SCARD", "S"])), Reply::Integer(0));
    }
}

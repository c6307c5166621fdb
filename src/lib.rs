// src/lib.rs
//! crab-set 库：store / types / lock / engine / protocol / server / monitor / config

pub mod config;    // JSON 配置
pub mod engine;    // 命令分发
pub mod error;     // 错误类型
pub mod lock;      // 按 key 串行化写操作
pub mod monitor;   // 监控指标
pub mod protocol;  // RESP 协议编解码
pub mod server;    // 网络层
pub mod store;     // 有序 KV 存储 (sled / memory)
pub mod types;     // Set 数据结构

pub use engine::Engine;
pub use error::{Error, Result};

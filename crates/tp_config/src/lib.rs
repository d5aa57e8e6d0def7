// crates/tp_config/src/lib.rs

//! Tidepool Config Layer
//!
//! 配置层，提供模拟参数、执行后端选择以及 JSON 读写。
//!
//! # 模块概览
//!
//! - [`backend`]: BackendKind 执行后端枚举
//! - [`simulation_config`]: SimulationConfig 模拟配置（全 f64）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 3: tp_physics     ─> uses SimulationConfig, BackendKind
//! Layer 2: tp_config      ─> SimulationConfig, BackendKind (本层)
//! Layer 1: tp_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod simulation_config;

// 重导出核心类型
pub use backend::BackendKind;
pub use error::ConfigError;
pub use simulation_config::SimulationConfig;

// crates/tp_foundation/src/lib.rs

//! Tidepool Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型与验证工具。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `TpError` / `TpResult`，检查函数与 `ensure!` 宏
//! - [`validation`]: 表面拓扑的一次性验证报告
//!
//! # 示例
//!
//! ```
//! use tp_foundation::{ensure, TpError, TpResult};
//!
//! fn spans(limits: &[(f64, f64)]) -> TpResult<usize> {
//!     ensure!(!limits.is_empty(), TpError::invalid_input("逐列边界不能为空"));
//!     Ok(limits.len())
//! }
//!
//! assert_eq!(spans(&[(-1.0, 1.0)]), Ok(1));
//! assert!(spans(&[]).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod validation;

// 重导出常用类型
pub use error::{TpError, TpResult};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};


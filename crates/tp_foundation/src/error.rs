// crates/tp_foundation/src/error.rs

//! 统一错误类型
//!
//! 液面模拟只有两类运行期错误来源：构造阶段的非法几何/拓扑输入，
//! 以及交互接口传入的越界索引或非法数值。两者都以 `TpError` 返回，
//! 从不把请求修正到其他单元。数值截断造成的体积漂移不是错误。
//!
//! # 示例
//!
//! ```
//! use tp_foundation::{TpError, TpResult};
//!
//! fn acceleration(index: usize, n_cells: usize, force: f64, mass: f64) -> TpResult<f64> {
//!     TpError::check_cell(index, n_cells)?;
//!     TpError::check_finite("force", force)?;
//!     TpError::check_positive("mass", mass)?;
//!     Ok(force / mass)
//! }
//!
//! assert_eq!(acceleration(0, 4, 3.0, 2.0), Ok(1.5));
//! assert!(matches!(
//!     acceleration(4, 4, 1.0, 1.0),
//!     Err(TpError::CellOutOfBounds { index: 4, n_cells: 4 })
//! ));
//! assert!(acceleration(0, 4, 1.0, 0.0).is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type TpResult<T> = Result<T, TpError>;

/// Tidepool 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TpError {
    /// 单元索引不在 `[0, n_cells)` 内
    #[error("单元 {index} 不存在 (共 {n_cells} 个单元)")]
    CellOutOfBounds {
        /// 请求的单元
        index: usize,
        /// 单元总数
        n_cells: usize,
    },

    /// 数值为 NaN 或无穷
    #[error("{field} 必须为有限值, 实际 {value}")]
    NonFinite {
        /// 参数名
        field: &'static str,
        /// 实际值
        value: f64,
    },

    /// 数值必须为正
    #[error("{field} 必须为正的有限值, 实际 {value}")]
    NotPositive {
        /// 参数名
        field: &'static str,
        /// 实际值
        value: f64,
    },

    /// 数组长度与单元数不一致
    #[error("{name} 长度为 {actual}, 应与单元数 {expected} 一致")]
    SizeMismatch {
        /// 数组名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 无效的表面拓扑（悬垂邻居、单元数溢出等）
    #[error("无效的表面拓扑: {message}")]
    InvalidTopology {
        /// 具体原因
        message: String,
    },

    /// 其他非法输入
    #[error("无效的输入: {message}")]
    InvalidInput {
        /// 具体原因
        message: String,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体原因
        message: String,
    },
}

impl TpError {
    /// 其他非法输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 无效拓扑
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    // ========== 检查 ==========

    /// 单元索引必须存在
    #[inline]
    pub fn check_cell(index: usize, n_cells: usize) -> TpResult<()> {
        if index < n_cells {
            Ok(())
        } else {
            Err(Self::CellOutOfBounds { index, n_cells })
        }
    }

    /// 数值必须有限
    #[inline]
    pub fn check_finite(field: &'static str, value: f64) -> TpResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::NonFinite { field, value })
        }
    }

    /// 数值必须为正且有限（NaN 不通过）
    #[inline]
    pub fn check_positive(field: &'static str, value: f64) -> TpResult<()> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(Self::NotPositive { field, value })
        }
    }
}

/// 条件不满足时提前返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

// crates/tp_foundation/src/validation.rs

//! 拓扑验证报告
//!
//! 表面拓扑构建完成后做一次完整检查，收集全部问题而不是遇到第一个就返回，
//! 便于一次性定位不规则边界上的所有异常单元。错误会阻止模拟创建，警告只记录。
//!
//! # 示例
//!
//! ```
//! use tp_foundation::validation::{ValidationError, ValidationReport, ValidationWarning};
//!
//! let mut report = ValidationReport::new();
//! report.add_warning(ValidationWarning::EmptyStrip { strip: 2 });
//! assert!(report.is_valid());
//!
//! report.add_error(ValidationError::LinkOutOfRange {
//!     cell: 3,
//!     direction: "nextX",
//!     link: 12,
//!     n_cells: 10,
//! });
//! assert!(!report.is_valid());
//! assert_eq!(report.errors().len(), 1);
//! ```

use std::fmt;

use thiserror::Error;

/// 拓扑错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 邻居表长度与单元数不一致
    #[error("邻居表长度 {actual} 与单元数 {expected} 不一致")]
    LengthMismatch {
        /// 单元数
        expected: usize,
        /// 邻居表长度
        actual: usize,
    },

    /// 邻居索引越界
    #[error("单元 {cell} 的 {direction} 邻居 {link} 超出 0..{n_cells}")]
    LinkOutOfRange {
        /// 单元索引
        cell: usize,
        /// 方向名
        direction: &'static str,
        /// 邻居索引
        link: usize,
        /// 单元数
        n_cells: usize,
    },

    /// 邻居不是几何邻居，缺失方向也未指向自身
    #[error("单元 {cell} 的 {direction} 邻居为 {link}, 期望 {expected}")]
    LinkMismatch {
        /// 单元索引
        cell: usize,
        /// 方向名
        direction: &'static str,
        /// 实际邻居
        link: usize,
        /// 期望邻居
        expected: usize,
    },

    /// 邻接关系不对称
    #[error("单元 {cell} 的 {direction} 邻居 {link} 没有反向指回")]
    AsymmetricLink {
        /// 单元索引
        cell: usize,
        /// 方向名
        direction: &'static str,
        /// 邻居索引
        link: usize,
    },
}

/// 拓扑警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// 列中没有任何单元（通常来自 `front < back` 的边界）
    EmptyStrip {
        /// 列索引
        strip: usize,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStrip { strip } => write!(f, "第 {} 列没有单元", strip),
        }
    }
}

/// 验证报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// 创建空报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录错误
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 记录警告
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 没有错误即视为通过
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 全部错误
    #[inline]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// 全部警告
    #[inline]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 个错误, {} 个警告",
            self.errors.len(),
            self.warnings.len()
        )?;
        // 只展开前几条，单元数很大时报告仍然可读
        for err in self.errors.iter().take(8) {
            write!(f, "; {}", err)?;
        }
        if self.errors.len() > 8 {
            write!(f, "; ...")?;
        }
        Ok(())
    }
}

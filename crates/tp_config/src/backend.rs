// crates/tp_config/src/backend.rs

//! 执行后端选择
//!
//! 提供 `BackendKind` 枚举，在应用层选择模拟管线的调度方式。
//! 所有后端在可观测输出上等价，仅内部调度不同。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 执行后端枚举
///
/// # 策略说明
///
/// - `Sequential`: 单线程，按单元索引顺序逐阶段执行
/// - `ChunkParallel`: 单元划分为 K 个连续块，扩散阶段按块并行，
///   块间通过一次全局归约屏障得到总体积
/// - `CellParallel`: 逐单元细粒度数据并行
/// - `Auto`: 根据单元数自动选择
///
/// # 示例
///
/// ```rust
/// use tp_config::BackendKind;
///
/// let kind: BackendKind = "chunk_parallel".parse().unwrap();
/// assert_eq!(kind, BackendKind::ChunkParallel);
/// assert_eq!(kind.resolve(10, 4096), BackendKind::ChunkParallel);
/// assert_eq!(BackendKind::Auto.resolve(10, 4096), BackendKind::Sequential);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 串行执行
    Sequential,
    /// 分块并行
    ChunkParallel,
    /// 逐单元并行
    CellParallel,
    /// 自动选择（根据问题规模）
    #[default]
    Auto,
}

impl BackendKind {
    /// 后端名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::ChunkParallel => "chunk_parallel",
            Self::CellParallel => "cell_parallel",
            Self::Auto => "auto",
        }
    }

    /// 是否使用多线程
    #[inline]
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::ChunkParallel | Self::CellParallel)
    }

    /// 将 `Auto` 解析为具体后端
    ///
    /// 单元数低于 `min_parallel_size` 时选择串行，否则选择分块并行。
    /// 非 `Auto` 的取值原样返回。
    pub fn resolve(self, n_cells: usize, min_parallel_size: usize) -> Self {
        match self {
            Self::Auto if n_cells < min_parallel_size => Self::Sequential,
            Self::Auto => Self::ChunkParallel,
            other => other,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 后端解析错误
#[derive(Debug, Clone)]
pub struct BackendParseError(String);

impl std::fmt::Display for BackendParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "未知后端 '{}', 可选: sequential, chunk_parallel, cell_parallel, auto",
            self.0
        )
    }
}

impl std::error::Error for BackendParseError {}

impl FromStr for BackendKind {
    type Err = BackendParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" | "reference" => Ok(Self::Sequential),
            "chunk_parallel" | "chunked" | "jobs" => Ok(Self::ChunkParallel),
            "cell_parallel" | "cellwise" => Ok(Self::CellParallel),
            "auto" => Ok(Self::Auto),
            _ => Err(BackendParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_auto() {
        assert_eq!(BackendKind::default(), BackendKind::Auto);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Sequential".parse::<BackendKind>().unwrap(), BackendKind::Sequential);
        assert_eq!("chunk-parallel".parse::<BackendKind>().unwrap(), BackendKind::ChunkParallel);
        assert_eq!("jobs".parse::<BackendKind>().unwrap(), BackendKind::ChunkParallel);
        assert_eq!("cellwise".parse::<BackendKind>().unwrap(), BackendKind::CellParallel);
        assert!("gpu".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_resolve_auto() {
        assert_eq!(BackendKind::Auto.resolve(100, 4096), BackendKind::Sequential);
        assert_eq!(BackendKind::Auto.resolve(4096, 4096), BackendKind::ChunkParallel);
        assert_eq!(BackendKind::CellParallel.resolve(1, 4096), BackendKind::CellParallel);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&BackendKind::ChunkParallel).unwrap();
        assert_eq!(json, "\"chunk_parallel\"");
        let parsed: BackendKind = serde_json::from_str("\"cell_parallel\"").unwrap();
        assert_eq!(parsed, BackendKind::CellParallel);
    }
}

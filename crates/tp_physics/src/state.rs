// crates/tp_physics/src/state.rs

//! 高度场状态管理
//!
//! 持有逐单元的高度与竖直速度数组，以及由表面拓扑生成的不可变邻居表。
//!
//! # 布局设计
//!
//! 采用 SoA 布局，两个数组长度恒等于单元数：
//! ```text
//! height: [h_0, h_1, h_2, ...]
//! speed:  [v_0, v_1, v_2, ...]
//! ```
//!
//! 邻居表在构造时一次性验证；悬垂索引属于前置条件违反，
//! 直接拒绝构造，不在每个时间步重复检查。

use std::sync::Arc;

use thiserror::Error;
use tp_foundation::{TpError, TpResult};

use crate::topology::{Direction, Neighbor, SurfaceTopology};

// ============================================================
// 错误类型
// ============================================================

/// 状态构造/验证错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StateError {
    /// 邻居索引越界
    #[error("单元 {cell} 的 {direction} 邻居 {neighbor} 超出范围 0..{n_cells}")]
    DanglingNeighbor {
        /// 单元索引
        cell: usize,
        /// 方向
        direction: Direction,
        /// 越界的邻居索引
        neighbor: usize,
        /// 单元数
        n_cells: usize,
    },

    /// 数组长度不一致
    #[error("数组长度不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数组名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 非有限值
    #[error("单元 {cell} 的 {field} 为非有限值 {value}")]
    NonFinite {
        /// 字段名
        field: &'static str,
        /// 单元索引
        cell: usize,
        /// 数值
        value: f64,
    },
}

impl From<StateError> for TpError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::SizeMismatch {
                name,
                expected,
                actual,
            } => TpError::SizeMismatch {
                name,
                expected,
                actual,
            },
            StateError::NonFinite { field, value, .. } => TpError::NonFinite { field, value },
            other => TpError::invalid_topology(other.to_string()),
        }
    }
}

// ============================================================
// 高度场状态 (SoA 布局)
// ============================================================

/// 高度场状态
///
/// 除显式播种外，高度与速度均零初始化。
#[derive(Debug, Clone)]
pub struct HeightFieldState {
    height: Vec<f64>,
    speed: Vec<f64>,
    neighbors: Arc<[Neighbor]>,
}

impl HeightFieldState {
    /// 由邻居表创建零初始化状态
    pub fn new(neighbors: impl Into<Arc<[Neighbor]>>) -> Result<Self, StateError> {
        let neighbors = neighbors.into();
        let n_cells = neighbors.len();
        Self::with_heights(neighbors, vec![0.0; n_cells])
    }

    /// 由邻居表和初始高度创建状态
    pub fn with_heights(
        neighbors: impl Into<Arc<[Neighbor]>>,
        height: Vec<f64>,
    ) -> Result<Self, StateError> {
        let neighbors = neighbors.into();
        let n_cells = neighbors.len();

        if height.len() != n_cells {
            return Err(StateError::SizeMismatch {
                name: "height",
                expected: n_cells,
                actual: height.len(),
            });
        }
        Self::check_neighbors(&neighbors)?;

        Ok(Self {
            height,
            speed: vec![0.0; n_cells],
            neighbors,
        })
    }

    /// 由拓扑创建零初始化状态
    pub fn from_topology(topology: &SurfaceTopology) -> Result<Self, StateError> {
        Self::new(topology.neighbors())
    }

    fn check_neighbors(neighbors: &[Neighbor]) -> Result<(), StateError> {
        let n_cells = neighbors.len();
        for (cell, neighbor) in neighbors.iter().enumerate() {
            for direction in Direction::ALL {
                let link = neighbor.get(direction);
                if link >= n_cells {
                    return Err(StateError::DanglingNeighbor {
                        cell,
                        direction,
                        neighbor: link,
                        n_cells,
                    });
                }
            }
        }
        Ok(())
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.height.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height.is_empty()
    }

    // ========== 状态访问 ==========

    /// 单元高度
    #[inline]
    pub fn height(&self, idx: usize) -> Option<f64> {
        self.height.get(idx).copied()
    }

    /// 单元竖直速度
    #[inline]
    pub fn speed(&self, idx: usize) -> Option<f64> {
        self.speed.get(idx).copied()
    }

    /// 高度切片
    #[inline]
    pub fn heights(&self) -> &[f64] {
        &self.height
    }

    /// 速度切片
    #[inline]
    pub fn speeds(&self) -> &[f64] {
        &self.speed
    }

    /// 邻居表
    #[inline]
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    // ========== 状态修改 ==========

    /// 可变高度切片（用于播种）
    #[inline]
    pub fn heights_mut(&mut self) -> &mut [f64] {
        &mut self.height
    }

    /// 可变速度切片
    #[inline]
    pub fn speeds_mut(&mut self) -> &mut [f64] {
        &mut self.speed
    }

    /// 设置单元高度
    pub fn set_height(&mut self, idx: usize, value: f64) -> TpResult<()> {
        TpError::check_cell(idx, self.n_cells())?;
        self.height[idx] = value;
        Ok(())
    }

    /// 全部单元设为同一高度
    pub fn fill_height(&mut self, value: f64) {
        self.height.fill(value);
    }

    /// 高度与速度全部归零
    pub fn reset(&mut self) {
        self.height.fill(0.0);
        self.speed.fill(0.0);
    }

    /// 同时借出高度、速度与邻居表
    ///
    /// 执行后端据此在同一时间步内对两个数组施加不同的读写权限。
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&mut [f64], &mut [f64], &[Neighbor]) {
        (&mut self.height, &mut self.speed, &self.neighbors)
    }

    // ========== 积分计算 ==========

    /// 高度总和（体积代理量，单位为高度 × 单元数）
    pub fn total_volume(&self) -> f64 {
        self.height.iter().sum()
    }

    /// 检查 NaN/Inf
    pub fn validate(&self) -> Result<(), StateError> {
        for (cell, &value) in self.height.iter().enumerate() {
            if !value.is_finite() {
                return Err(StateError::NonFinite {
                    field: "height",
                    cell,
                    value,
                });
            }
        }
        for (cell, &value) in self.speed.iter().enumerate() {
            if !value.is_finite() {
                return Err(StateError::NonFinite {
                    field: "speed",
                    cell,
                    value,
                });
            }
        }
        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_initialized() {
        let topo = SurfaceTopology::uniform(4, 5);
        let state = HeightFieldState::from_topology(&topo).unwrap();
        assert_eq!(state.n_cells(), 20);
        assert_eq!(state.heights().len(), state.speeds().len());
        assert!(state.heights().iter().all(|&h| h == 0.0));
        assert!(state.speeds().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_dangling_neighbor_rejected() {
        let mut neighbors = SurfaceTopology::uniform(2, 2).into_neighbors();
        neighbors[3].prev_x = 4;
        let err = HeightFieldState::new(neighbors).unwrap_err();
        assert_eq!(
            err,
            StateError::DanglingNeighbor {
                cell: 3,
                direction: Direction::PrevX,
                neighbor: 4,
                n_cells: 4,
            }
        );
    }

    #[test]
    fn test_height_length_mismatch() {
        let topo = SurfaceTopology::uniform(2, 2);
        let result = HeightFieldState::with_heights(topo.neighbors(), vec![0.0; 3]);
        assert!(matches!(result, Err(StateError::SizeMismatch { .. })));
    }

    #[test]
    fn test_set_height_out_of_range() {
        let topo = SurfaceTopology::uniform(2, 2);
        let mut state = HeightFieldState::from_topology(&topo).unwrap();
        assert!(state.set_height(3, 1.5).is_ok());
        assert_eq!(state.height(3), Some(1.5));
        assert!(state.set_height(4, 1.0).is_err());
        assert_eq!(state.height(4), None);
    }

    #[test]
    fn test_total_volume() {
        let topo = SurfaceTopology::uniform(2, 3);
        let mut state = HeightFieldState::from_topology(&topo).unwrap();
        state.fill_height(0.5);
        assert!((state.total_volume() - 3.0).abs() < 1e-12);
        state.reset();
        assert_eq!(state.total_volume(), 0.0);
    }

    #[test]
    fn test_validate_non_finite() {
        let topo = SurfaceTopology::uniform(1, 2);
        let mut state = HeightFieldState::from_topology(&topo).unwrap();
        assert!(state.validate().is_ok());
        state.speeds_mut()[1] = f64::NAN;
        assert!(matches!(
            state.validate(),
            Err(StateError::NonFinite { field: "speed", cell: 1, .. })
        ));
    }

    #[test]
    fn test_state_error_into_tp_error() {
        let err: TpError = StateError::SizeMismatch {
            name: "height",
            expected: 2,
            actual: 1,
        }
        .into();
        assert!(matches!(err, TpError::SizeMismatch { .. }));
    }
}

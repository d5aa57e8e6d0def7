// crates/tp_physics/src/volume.rs

//! 体积跟踪
//!
//! 记录液面的基准体积与各排水体（浸入液面的物体）的当前排水体积，
//! 每个时间步据此计算目标体积：
//!
//! ```text
//! target_volume     = baseline + Σ submerged          (世界体积)
//! target_height_sum = target_volume / res²            (引擎使用的高度和)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tp_foundation::{TpError, TpResult};

use crate::state::HeightFieldState;

/// 排水体标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisplacerId(u64);

impl DisplacerId {
    /// 原始编号
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DisplacerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "displacer#{}", self.0)
    }
}

/// 体积跟踪器
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTracker {
    cell_area: f64,
    baseline_volume: f64,
    displacers: BTreeMap<DisplacerId, f64>,
    next_id: u64,
}

impl VolumeTracker {
    /// 以给定单元面积与基准体积创建
    pub fn new(cell_area: f64, baseline_volume: f64) -> TpResult<Self> {
        TpError::check_positive("cell_area", cell_area)?;
        TpError::check_finite("baseline_volume", baseline_volume)?;
        Ok(Self {
            cell_area,
            baseline_volume,
            displacers: BTreeMap::new(),
            next_id: 0,
        })
    }

    /// 以状态当前的高度和作为基准体积
    pub fn from_state(state: &HeightFieldState, cell_area: f64) -> TpResult<Self> {
        Self::new(cell_area, state.total_volume() * cell_area)
    }

    /// 注册排水体，初始排水体积为零
    pub fn register(&mut self) -> DisplacerId {
        let id = DisplacerId(self.next_id);
        self.next_id += 1;
        self.displacers.insert(id, 0.0);
        log::debug!("注册排水体 {id}");
        id
    }

    /// 更新排水体当前浸没体积
    pub fn update(&mut self, id: DisplacerId, submerged_volume: f64) -> TpResult<()> {
        TpError::check_finite("submerged_volume", submerged_volume)?;
        let slot = self
            .displacers
            .get_mut(&id)
            .ok_or_else(|| TpError::invalid_input(format!("未注册的排水体 {id}")))?;
        *slot = submerged_volume;
        Ok(())
    }

    /// 移除排水体，返回其最后的浸没体积
    pub fn remove(&mut self, id: DisplacerId) -> Option<f64> {
        self.displacers.remove(&id)
    }

    /// 单个排水体的浸没体积
    pub fn submerged(&self, id: DisplacerId) -> Option<f64> {
        self.displacers.get(&id).copied()
    }

    /// 所有排水体的浸没体积之和
    pub fn submerged_total(&self) -> f64 {
        self.displacers.values().sum()
    }

    /// 排水体数量
    #[inline]
    pub fn displacer_count(&self) -> usize {
        self.displacers.len()
    }

    /// 基准体积
    #[inline]
    pub fn baseline_volume(&self) -> f64 {
        self.baseline_volume
    }

    /// 单元面积
    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.cell_area
    }

    /// 目标体积（世界单位）
    #[inline]
    pub fn target_volume(&self) -> f64 {
        self.baseline_volume + self.submerged_total()
    }

    /// 目标高度和（引擎单位）
    #[inline]
    pub fn target_height_sum(&self) -> f64 {
        self.target_volume() / self.cell_area
    }

    /// 状态的当前体积（世界单位）
    #[inline]
    pub fn measured_volume(&self, state: &HeightFieldState) -> f64 {
        state.total_volume() * self.cell_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::SurfaceTopology;

    #[test]
    fn test_baseline_from_state() {
        let topo = SurfaceTopology::uniform(2, 2);
        let mut state = HeightFieldState::from_topology(&topo).unwrap();
        state.fill_height(1.0);

        let tracker = VolumeTracker::from_state(&state, 0.25).unwrap();
        assert!((tracker.baseline_volume() - 1.0).abs() < 1e-15);
        assert!((tracker.target_height_sum() - 4.0).abs() < 1e-15);
        assert!((tracker.measured_volume(&state) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_displacers_shift_target() {
        let mut tracker = VolumeTracker::new(0.25, 10.0).unwrap();
        let a = tracker.register();
        let b = tracker.register();
        assert_ne!(a, b);

        tracker.update(a, 0.5).unwrap();
        tracker.update(b, 0.25).unwrap();
        assert!((tracker.target_volume() - 10.75).abs() < 1e-12);
        assert!((tracker.target_height_sum() - 43.0).abs() < 1e-12);

        assert_eq!(tracker.remove(a), Some(0.5));
        assert!((tracker.target_volume() - 10.25).abs() < 1e-12);
        assert!(tracker.update(a, 1.0).is_err());
        assert_eq!(tracker.displacer_count(), 1);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            VolumeTracker::new(0.0, 1.0),
            Err(TpError::NotPositive { field: "cell_area", .. })
        ));
        assert!(VolumeTracker::new(1.0, f64::INFINITY).is_err());
        let mut tracker = VolumeTracker::new(1.0, 1.0).unwrap();
        let id = tracker.register();
        assert!(tracker.update(id, f64::NAN).is_err());
        assert_eq!(tracker.submerged(id), Some(0.0));
    }
}

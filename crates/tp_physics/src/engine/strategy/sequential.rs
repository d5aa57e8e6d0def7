// crates/tp_physics/src/engine/strategy/sequential.rs

//! 串行后端
//!
//! 单线程，按单元索引顺序逐阶段执行，作为其余后端的参考实现。

use super::SimulationStrategy;
use crate::engine::forces::ForceRequest;
use crate::engine::kernels;
use crate::engine::{StepParams, StepReport};
use crate::state::HeightFieldState;

/// 串行策略
#[derive(Debug, Clone, Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    /// 创建策略
    pub fn new() -> Self {
        Self
    }
}

impl SimulationStrategy for SequentialStrategy {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn step(
        &mut self,
        state: &mut HeightFieldState,
        forces: &[ForceRequest],
        params: &StepParams,
    ) -> StepReport {
        let n_cells = state.n_cells();
        let (height, speed, neighbors) = state.split_mut();

        let forces_applied = kernels::apply_forces(speed, forces, params.dt);

        let measured_volume = kernels::diffuse_range(
            height,
            neighbors,
            0,
            speed,
            params.transfer_rate(),
            params.viscosity,
        );

        let volume_per_cell =
            kernels::volume_correction(params.target_volume, measured_volume, n_cells);

        let clamped_cells = kernels::advect_range(height, speed, volume_per_cell, params.dt);

        StepReport {
            measured_volume,
            volume_per_cell,
            forces_applied,
            clamped_cells,
        }
    }
}

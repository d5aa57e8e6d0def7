// crates/tp_physics/src/engine/strategy/cellwise.rs

//! 逐单元并行后端
//!
//! 扩散与体积测量作为两个独立任务同时执行（二者只读同一高度快照），
//! 平流随后逐单元并行。

use rayon::prelude::*;

use super::SimulationStrategy;
use crate::engine::forces::ForceRequest;
use crate::engine::kernels;
use crate::engine::{StepParams, StepReport};
use crate::state::HeightFieldState;

/// 逐单元并行策略
#[derive(Debug, Clone, Default)]
pub struct CellParallelStrategy;

impl CellParallelStrategy {
    /// 创建策略
    pub fn new() -> Self {
        Self
    }
}

impl SimulationStrategy for CellParallelStrategy {
    fn name(&self) -> &'static str {
        "cell_parallel"
    }

    fn is_parallel(&self) -> bool {
        true
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

        let transfer_rate = params.transfer_rate();
        let viscosity = params.viscosity;
        let snapshot: &[f64] = height;
        let (measured_volume, ()) = rayon::join(
            || snapshot.par_iter().sum::<f64>(),
            || {
                speed.par_iter_mut().enumerate().for_each(|(cell, v)| {
                    *v = kernels::diffuse_cell(
                        snapshot,
                        &neighbors[cell],
                        cell,
                        *v,
                        transfer_rate,
                        viscosity,
                    );
                })
            },
        );

        let volume_per_cell =
            kernels::volume_correction(params.target_volume, measured_volume, n_cells);

        let dt = params.dt;
        let clamped_cells = height
            .par_iter_mut()
            .zip(speed.par_iter())
            .map(|(h, &v)| {
                let (next, clamped) = kernels::advect_cell(*h, volume_per_cell, v, dt);
                *h = next;
                clamped as usize
            })
            .sum();

        StepReport {
            measured_volume,
            volume_per_cell,
            forces_applied,
            clamped_cells,
        }
    }
}

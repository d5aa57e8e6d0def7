// crates/tp_physics/src/engine/strategy/chunked.rs

//! 分块并行后端
//!
//! 单元划分为 K 个连续块：
//!
//! ```text
//! 扩散:   [chunk 0] [chunk 1] ... [chunk K-1]   各块只写自己的速度切片 + 局部体积
//!            \         |            /
//! 归约:        Σ partial_volumes              单次屏障
//!                      |
//! 平流:   逐单元数据并行，无跨单元依赖
//! ```
//!
//! 扩散阶段高度只读，速度按块分割，不需要任何锁。

use rayon::prelude::*;

use super::SimulationStrategy;
use crate::engine::forces::ForceRequest;
use crate::engine::kernels;
use crate::engine::{StepParams, StepReport};
use crate::state::HeightFieldState;

/// 默认块数
pub const DEFAULT_CHUNK_COUNT: usize = 16;

/// 分块并行策略
#[derive(Debug, Clone)]
pub struct ChunkParallelStrategy {
    /// 配置的块数（0 表示使用 rayon 线程数）
    chunk_count: usize,
    /// 各块的局部体积，跨时间步复用
    partial_volumes: Vec<f64>,
}

impl Default for ChunkParallelStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_COUNT)
    }
}

impl ChunkParallelStrategy {
    /// 创建策略
    pub fn new(chunk_count: usize) -> Self {
        Self {
            chunk_count,
            partial_volumes: Vec::new(),
        }
    }

    /// 实际使用的块数
    pub fn effective_chunk_count(&self) -> usize {
        if self.chunk_count == 0 {
            rayon::current_num_threads().max(1)
        } else {
            self.chunk_count
        }
    }

    /// 给定单元数时的块长度（最后一块可能更短）
    pub fn chunk_size(&self, n_cells: usize) -> usize {
        n_cells.div_ceil(self.effective_chunk_count()).max(1)
    }
}

impl SimulationStrategy for ChunkParallelStrategy {
    fn name(&self) -> &'static str {
        "chunk_parallel"
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
        let chunk_size = self.chunk_size(n_cells);
        let (height, speed, neighbors) = state.split_mut();

        // 阶段 1：外力串行施加
        let forces_applied = kernels::apply_forces(speed, forces, params.dt);

        // 阶段 2 + 3：各块独立扩散并累计局部体积
        let transfer_rate = params.transfer_rate();
        let viscosity = params.viscosity;
        {
            let snapshot: &[f64] = height;
            speed
                .par_chunks_mut(chunk_size)
                .enumerate()
                .map(|(chunk, speeds)| {
                    kernels::diffuse_range(
                        snapshot,
                        neighbors,
                        chunk * chunk_size,
                        speeds,
                        transfer_rate,
                        viscosity,
                    )
                })
                .collect_into_vec(&mut self.partial_volumes);
        }

        // 阶段 4：对 K 个局部体积做单次归约
        let measured_volume: f64 = self.partial_volumes.iter().sum();
        let volume_per_cell =
            kernels::volume_correction(params.target_volume, measured_volume, n_cells);

        // 阶段 5：平流
        let dt = params.dt;
        let clamped_cells = height
            .par_chunks_mut(chunk_size)
            .zip(speed.par_chunks(chunk_size))
            .map(|(h, v)| kernels::advect_range(h, v, volume_per_cell, dt))
            .sum();

        StepReport {
            measured_volume,
            volume_per_cell,
            forces_applied,
            clamped_cells,
        }
    }
}

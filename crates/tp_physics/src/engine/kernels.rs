// crates/tp_physics/src/engine/kernels.rs

//! 单元级计算核
//!
//! 所有执行后端共享同一组逐单元算式，保证浮点运算顺序一致：
//! 后端之间唯一的差别是体积求和的结合顺序。

use crate::engine::forces::ForceRequest;
use crate::topology::Neighbor;

/// 阶段 1：施加外力 `speed[i] += a · Δt`
///
/// 返回施加的请求数。
pub(crate) fn apply_forces(speed: &mut [f64], forces: &[ForceRequest], dt: f64) -> usize {
    for force in forces {
        speed[force.index] += force.acceleration * dt;
    }
    forces.len()
}

/// 阶段 2：单个单元的扩散
///
/// `v ← (v + (avg(邻居高度) − h) · transfer_rate) · viscosity`
#[inline]
pub(crate) fn diffuse_cell(
    height: &[f64],
    neighbor: &Neighbor,
    cell: usize,
    speed: f64,
    transfer_rate: f64,
    viscosity: f64,
) -> f64 {
    let average = (height[neighbor.prev_x]
        + height[neighbor.next_x]
        + height[neighbor.prev_z]
        + height[neighbor.next_z])
        / 4.0;
    (speed + (average - height[cell]) * transfer_rate) * viscosity
}

/// 阶段 2 + 3：对从 `start` 开始的连续单元做扩散，并返回该区间的高度和
///
/// `speed` 是这段区间自己的速度切片；`height` 只读。
pub(crate) fn diffuse_range(
    height: &[f64],
    neighbors: &[Neighbor],
    start: usize,
    speed: &mut [f64],
    transfer_rate: f64,
    viscosity: f64,
) -> f64 {
    let mut local_volume = 0.0;
    for (offset, v) in speed.iter_mut().enumerate() {
        let cell = start + offset;
        *v = diffuse_cell(height, &neighbors[cell], cell, *v, transfer_rate, viscosity);
        local_volume += height[cell];
    }
    local_volume
}

/// 阶段 4：每单元体积修正量
#[inline]
pub(crate) fn volume_correction(target_volume: f64, measured_volume: f64, n_cells: usize) -> f64 {
    if n_cells == 0 {
        return 0.0;
    }
    (target_volume - measured_volume) / n_cells as f64
}

/// 阶段 5：单个单元的平流
///
/// 返回新高度以及是否触发了零下限截断。
#[inline]
pub(crate) fn advect_cell(height: f64, correction: f64, speed: f64, dt: f64) -> (f64, bool) {
    let raw = height + correction + speed * dt;
    if raw < 0.0 {
        (0.0, true)
    } else {
        (raw, false)
    }
}

/// 阶段 5：连续区间的平流，返回截断单元数
pub(crate) fn advect_range(height: &mut [f64], speed: &[f64], correction: f64, dt: f64) -> usize {
    let mut clamped = 0;
    for (h, &v) in height.iter_mut().zip(speed) {
        let (next, was_clamped) = advect_cell(*h, correction, v, dt);
        *h = next;
        clamped += was_clamped as usize;
    }
    clamped
}

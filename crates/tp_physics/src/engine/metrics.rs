// crates/tp_physics/src/engine/metrics.rs

//! 模拟性能与数值漂移指标

use std::time::Duration;

use crate::engine::StepReport;

/// 模拟指标
#[derive(Debug, Clone, Default)]
pub struct SimulationMetrics {
    /// 已完成时间步数
    pub total_steps: u64,
    /// 总计算时间
    pub total_duration: Duration,
    /// 累计截断单元数
    pub total_clamped_cells: u64,
    /// 累计施加的外力请求数
    pub total_forces: u64,
    /// 最近一步测得体积与目标体积之差（目标 − 测量）
    pub last_volume_error: f64,
}

impl SimulationMetrics {
    /// 记录一步
    pub fn record(&mut self, report: &StepReport, target_volume: f64, duration: Duration) {
        self.total_steps += 1;
        self.total_duration += duration;
        self.total_clamped_cells += report.clamped_cells as u64;
        self.total_forces += report.forces_applied as u64;
        self.last_volume_error = target_volume - report.measured_volume;
    }

    /// 重置指标
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 平均每步耗时
    pub fn avg_step_time(&self) -> Duration {
        if self.total_steps > 0 {
            self.total_duration.div_f64(self.total_steps as f64)
        } else {
            Duration::ZERO
        }
    }
}

// crates/tp_physics/src/engine/forces.rs

//! 延迟外力队列
//!
//! 外力请求先入队，在下一次 `simulate` 的第一阶段统一施加后清空。
//! 同一单元的多次请求按加法累积。

use tp_foundation::{TpError, TpResult};

/// 外力请求：`(单元索引, 加速度)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceRequest {
    /// 目标单元
    pub index: usize,
    /// 加速度（力 / 质量）
    pub acceleration: f64,
}

/// 外力队列
///
/// 单生产者单消费者：交互代码入队，引擎每个时间步恰好消费一次。
#[derive(Debug, Clone, Default)]
pub struct ForceQueue {
    pending: Vec<ForceRequest>,
}

impl ForceQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 入队外力
    ///
    /// 索引必须位于 `[0, n_cells)`，质量必须为正的有限值；
    /// 不合法的请求直接拒绝，不会被修正到其他单元。
    pub fn push(&mut self, index: usize, force: f64, mass: f64, n_cells: usize) -> TpResult<()> {
        TpError::check_cell(index, n_cells)?;
        TpError::check_positive("mass", mass)?;
        TpError::check_finite("force", force)?;

        self.pending.push(ForceRequest {
            index,
            acceleration: force / mass,
        });
        Ok(())
    }

    /// 取出全部待处理请求并清空队列
    pub fn drain(&mut self) -> Vec<ForceRequest> {
        std::mem::take(&mut self.pending)
    }

    /// 待处理请求
    #[inline]
    pub fn pending(&self) -> &[ForceRequest] {
        &self.pending
    }

    /// 待处理数量
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

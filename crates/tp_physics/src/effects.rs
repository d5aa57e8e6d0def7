// crates/tp_physics/src/effects.rs

//! 外部效果
//!
//! 对液面施加瞬时体积扰动的效果，每帧调用一次。

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tp_foundation::TpResult;

use crate::fluid::FluidSurface;

/// 降雨效果
///
/// 每帧在包围盒内随机落下 `floor(面积 · 速率 · Δt)` 个雨滴，
/// 每个雨滴在落点处造成 `strength` 的凹陷。
#[derive(Debug, Clone)]
pub struct RainEffect {
    /// 每平方米每秒雨滴数
    pub drops_per_m2_per_sec: f64,
    /// 单个雨滴的体积位移量
    pub strength: f64,
    rng: StdRng,
}

impl RainEffect {
    /// 以固定种子创建（结果可复现）
    pub fn new(drops_per_m2_per_sec: f64, strength: f64, seed: u64) -> Self {
        Self {
            drops_per_m2_per_sec,
            strength,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 本帧雨滴数
    pub fn drop_count(&self, area: f64, dt: f64) -> usize {
        let expected = area * self.drops_per_m2_per_sec * dt;
        if expected.is_finite() && expected > 0.0 {
            expected.floor() as usize
        } else {
            0
        }
    }

    /// 施加一帧降雨，返回实际落在液面上的雨滴数
    ///
    /// `strength` 非有限时第一个落在液面上的雨滴即返回错误。
    pub fn apply(&mut self, surface: &mut FluidSurface, dt: f64) -> TpResult<usize> {
        let grid = surface.grid();
        let (min, max) = (grid.bbox_min(), grid.bbox_max());
        let count = self.drop_count(grid.area(), dt);

        let mut landed = 0;
        for _ in 0..count {
            let x = self.rng.gen_range(min.x..=max.x);
            let z = self.rng.gen_range(min.z..=max.z);
            if surface
                .displace_volume_at(DVec3::new(x, max.y, z), -self.strength)?
                .is_some()
            {
                landed += 1;
            }
        }

        if count > 0 {
            log::trace!("降雨: {count} 个雨滴, {landed} 个落在液面上");
        }
        Ok(landed)
    }
}

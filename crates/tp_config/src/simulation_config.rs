// crates/tp_config/src/simulation_config.rs

//! SimulationConfig - 模拟配置（全 f64）
//!
//! 定义液面高度场模拟的全部可调参数，可通过 JSON 读写。
//! 缺省字段使用与交互演示一致的默认值。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::backend::BackendKind;
use crate::error::ConfigError;

/// 显式格式的稳定性上限：`diffusion_speed · Δt² < 2`
///
/// 四邻居拉普拉斯算子的特征值位于 `[-2, 0]`，半隐式欧拉积分在
/// `ω·Δt < 2` 时稳定，`ω² = 2·diffusion_speed`。
pub const STABILITY_LIMIT: f64 = 2.0;

/// 模拟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 网格间距（世界单位）
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: f64,

    /// 扩散速度（高度差转化为竖直加速度的系数）
    #[serde(default = "default_diffusion_speed")]
    pub diffusion_speed: f64,

    /// 粘性（每步速度乘性衰减，1.0 表示无衰减）
    #[serde(default = "default_viscosity")]
    pub viscosity: f64,

    /// 每帧子步数
    #[serde(default = "default_iterations")]
    pub iterations_per_step: u32,

    /// 执行后端
    #[serde(default)]
    pub backend: BackendKind,

    /// 分块并行的块数（0 表示使用 rayon 线程数）
    #[serde(default = "default_chunk_count")]
    pub chunk_count: usize,

    /// `Auto` 后端切换到并行的最小单元数
    #[serde(default = "default_min_parallel_size")]
    pub min_parallel_size: usize,
}

fn default_grid_resolution() -> f64 { 0.5 }
fn default_diffusion_speed() -> f64 { 20.0 }
fn default_viscosity() -> f64 { 0.998 }
fn default_iterations() -> u32 { 1 }
fn default_chunk_count() -> usize { 16 }
fn default_min_parallel_size() -> usize { 4096 }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_resolution: default_grid_resolution(),
            diffusion_speed: default_diffusion_speed(),
            viscosity: default_viscosity(),
            iterations_per_step: default_iterations(),
            backend: BackendKind::default(),
            chunk_count: default_chunk_count(),
            min_parallel_size: default_min_parallel_size(),
        }
    }
}

impl SimulationConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_resolution > 0.0 && self.grid_resolution.is_finite()) {
            return Err(ConfigError::invalid(
                "grid_resolution",
                self.grid_resolution,
                "网格间距必须为正的有限值",
            ));
        }

        if !(self.diffusion_speed >= 0.0 && self.diffusion_speed.is_finite()) {
            return Err(ConfigError::invalid(
                "diffusion_speed",
                self.diffusion_speed,
                "扩散速度不能为负",
            ));
        }

        if !(self.viscosity > 0.0 && self.viscosity <= 1.0) {
            return Err(ConfigError::invalid(
                "viscosity",
                self.viscosity,
                "粘性必须在 (0, 1] 范围内",
            ));
        }

        if self.iterations_per_step == 0 {
            return Err(ConfigError::invalid(
                "iterations_per_step",
                self.iterations_per_step,
                "每帧至少一个子步",
            ));
        }

        Ok(())
    }

    /// 网格间距平方（单元面积）
    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.grid_resolution * self.grid_resolution
    }

    /// 单帧时长对应的子步长
    #[inline]
    pub fn sub_step_dt(&self, frame_dt: f64) -> f64 {
        frame_dt / self.iterations_per_step.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend, BackendKind::Auto);
        assert_eq!(config.chunk_count, 16);
        assert!((config.cell_area() - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_viscosity() {
        let mut config = SimulationConfig::default();
        config.viscosity = 0.0;
        assert!(config.validate().is_err());
        config.viscosity = 1.5;
        assert!(config.validate().is_err());
        config.viscosity = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_resolution() {
        let mut config = SimulationConfig::default();
        config.grid_resolution = -0.5;
        assert!(config.validate().is_err());
        config.grid_resolution = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = SimulationConfig::default();
        config.iterations_per_step = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json(r#"{ "viscosity": 0.99, "backend": "sequential" }"#)
            .unwrap();
        assert_eq!(config.viscosity, 0.99);
        assert_eq!(config.backend, BackendKind::Sequential);
        assert_eq!(config.diffusion_speed, 20.0);
        assert_eq!(config.iterations_per_step, 1);
    }

    #[test]
    fn test_json_validation_error() {
        let result = SimulationConfig::from_json(r#"{ "viscosity": 2.0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = SimulationConfig::from_json("not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");

        let mut config = SimulationConfig::default();
        config.iterations_per_step = 4;
        config.backend = BackendKind::CellParallel;
        config.save_to_file(&path).unwrap();

        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let result = SimulationConfig::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_sub_step_dt() {
        let mut config = SimulationConfig::default();
        config.iterations_per_step = 4;
        assert!((config.sub_step_dt(0.02) - 0.005).abs() < 1e-15);
        config.iterations_per_step = 0;
        assert!((config.sub_step_dt(0.02) - 0.02).abs() < 1e-15);
    }
}

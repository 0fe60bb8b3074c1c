//! 双目标边界注册表
//!
//! 每个问题对应一对参考向量 `[lower, upper]`，用于把双目标得分归一化。
//! 两个目标的单位由问题决定（内置问题为 (负超体积, 运行秒数)，均为最小化）。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BoundError, ConfigError};

/// 旅行商双目标问题下界
pub const TSP_LOWER: [f64; 2] = [-1.0, 0.0];
/// 旅行商双目标问题上界
pub const TSP_UPPER: [f64; 2] = [0.0, 20.0];
/// 双目标背包问题下界
pub const KP_LOWER: [f64; 2] = [-1.0, 0.0];
/// 双目标背包问题上界
pub const KP_UPPER: [f64; 2] = [0.0, 10.0];

/// 一个问题的目标空间参考边界
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundPair {
    lower: [f64; 2],
    upper: [f64; 2],
}

impl BoundPair {
    /// 创建边界，要求所有分量有限且 lower[i] <= upper[i]
    pub fn new(lower: [f64; 2], upper: [f64; 2]) -> Result<Self, BoundError> {
        if lower.iter().chain(upper.iter()).any(|v| !v.is_finite()) {
            return Err(BoundError::NonFinite { lower, upper });
        }

        for objective in 0..2 {
            if lower[objective] > upper[objective] {
                return Err(BoundError::Inverted {
                    objective,
                    lower: lower[objective],
                    upper: upper[objective],
                });
            }
        }

        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> [f64; 2] {
        self.lower
    }

    pub fn upper(&self) -> [f64; 2] {
        self.upper
    }

    /// 以 `[lower, upper]` 形式返回
    pub fn as_array(&self) -> [[f64; 2]; 2] {
        [self.lower, self.upper]
    }

    /// 把原始得分线性映射到 [0, 1]（越界的得分不截断）
    ///
    /// 某个目标的上下界相等时，该目标归一化结果恒为 0。
    pub fn normalize(&self, score: [f64; 2]) -> [f64; 2] {
        let mut normalized = [0.0; 2];
        for i in 0..2 {
            let span = self.upper[i] - self.lower[i];
            normalized[i] = if span > 0.0 {
                (score[i] - self.lower[i]) / span
            } else {
                0.0
            };
        }
        normalized
    }
}

/// 配置文件中的边界定义
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundPairSpec {
    pub lower: [f64; 2],
    pub upper: [f64; 2],
}

impl BoundPairSpec {
    pub fn resolve(&self, problem: &str) -> Result<BoundPair, ConfigError> {
        BoundPair::new(self.lower, self.upper).map_err(|source| ConfigError::InvalidBounds {
            problem: problem.to_string(),
            source,
        })
    }
}

/// 内置边界，叠加配置文件中的覆盖项
///
/// `bi_cvrp` 没有内置边界；需要时在配置文件的 `[bounds.bi_cvrp]` 中给出。
pub fn builtin_bounds(
    overrides: &BTreeMap<String, BoundPairSpec>,
) -> Result<Vec<(String, BoundPair)>, ConfigError> {
    let builtin = [
        ("tsp_semo", TSP_LOWER, TSP_UPPER),
        ("bi_kp", KP_LOWER, KP_UPPER),
    ];

    let mut bounds: BTreeMap<String, BoundPair> = BTreeMap::new();
    for (problem, lower, upper) in builtin {
        let pair = BoundPairSpec { lower, upper }.resolve(problem)?;
        bounds.insert(problem.to_string(), pair);
    }

    for (problem, spec) in overrides {
        bounds.insert(problem.clone(), spec.resolve(problem)?);
    }

    Ok(bounds.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = BoundPair::new([0.0, 5.0], [1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            BoundError::Inverted {
                objective: 1,
                lower: 5.0,
                upper: 2.0
            }
        );
    }

    #[test]
    fn test_non_finite_bounds_rejected() {
        assert!(matches!(
            BoundPair::new([f64::NAN, 0.0], [1.0, 1.0]),
            Err(BoundError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_normalize_maps_into_unit_square() {
        let bounds = BoundPair::new([-1.0, 0.0], [0.0, 10.0]).unwrap();
        assert_eq!(bounds.normalize([-1.0, 0.0]), [0.0, 0.0]);
        assert_eq!(bounds.normalize([0.0, 10.0]), [1.0, 1.0]);
        assert_eq!(bounds.normalize([-0.5, 2.5]), [0.5, 0.25]);
    }

    #[test]
    fn test_degenerate_objective_normalizes_to_zero() {
        let bounds = BoundPair::new([1.0, 0.0], [1.0, 4.0]).unwrap();
        assert_eq!(bounds.normalize([3.0, 2.0]), [0.0, 0.5]);
    }

    #[test]
    fn test_builtin_bounds_without_cvrp() {
        let bounds = builtin_bounds(&BTreeMap::new()).unwrap();
        let ids: Vec<&str> = bounds.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["bi_kp", "tsp_semo"]);
    }

    #[test]
    fn test_override_adds_cvrp_bounds() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "bi_cvrp".to_string(),
            BoundPairSpec {
                lower: [-1.0, 0.0],
                upper: [0.0, 30.0],
            },
        );

        let bounds = builtin_bounds(&overrides).unwrap();
        assert!(bounds.iter().any(|(id, _)| id == "bi_cvrp"));
    }
}

//! 算法注册表
//!
//! 算法名 → (方法构造器, Profiler 构造器)

use std::sync::Arc;

use phf::phf_map;

use crate::error::{MethodError, ProfilerError};
use crate::services::{Profiler, ProfilerSettings, RunProfiler};
use crate::workflow::{HeuristicSearch, Method, MethodConfig};

/// 方法构造器
pub type MethodConstructor =
    Arc<dyn Fn(MethodConfig) -> Result<Box<dyn Method>, MethodError> + Send + Sync>;

/// Profiler 构造器
pub type ProfilerConstructor =
    Arc<dyn Fn(ProfilerSettings) -> Result<Arc<dyn Profiler>, ProfilerError> + Send + Sync>;

/// 内置算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    /// 多目标蒙特卡洛树搜索
    Momcts,
    /// 多目标启发式进化
    Meoh,
    /// NSGA-II 风格的遗传编程
    Nsga2,
    /// Pareto 网格引导的进化
    Mpage,
    /// 基于分解的多目标进化
    Moead,
}

static BUILTIN_ALGORITHMS: phf::Map<&'static str, AlgorithmKind> = phf_map! {
    "momcts" => AlgorithmKind::Momcts,
    "meoh" => AlgorithmKind::Meoh,
    "nsga2" => AlgorithmKind::Nsga2,
    "mpage" => AlgorithmKind::Mpage,
    "moead" => AlgorithmKind::Moead,
};

impl AlgorithmKind {
    /// 从配置中的算法名解析
    pub fn from_id(id: &str) -> Option<Self> {
        BUILTIN_ALGORITHMS.get(id).copied()
    }

    /// 所有内置算法
    pub fn all() -> impl Iterator<Item = (&'static str, AlgorithmKind)> {
        BUILTIN_ALGORITHMS.entries().map(|(id, kind)| (*id, *kind))
    }

    pub fn id(self) -> &'static str {
        match self {
            AlgorithmKind::Momcts => "momcts",
            AlgorithmKind::Meoh => "meoh",
            AlgorithmKind::Nsga2 => "nsga2",
            AlgorithmKind::Mpage => "mpage",
            AlgorithmKind::Moead => "moead",
        }
    }

    /// 方法名
    pub fn method_name(self) -> &'static str {
        match self {
            AlgorithmKind::Momcts => "MOMCTS_AHD",
            AlgorithmKind::Meoh => "MEoH",
            AlgorithmKind::Nsga2 => "NSGA2",
            AlgorithmKind::Mpage => "MPaGE",
            AlgorithmKind::Moead => "MOEAD",
        }
    }

    /// Profiler 名（MPaGE 沿用 EoH 的 Profiler）
    pub fn profiler_name(self) -> &'static str {
        match self {
            AlgorithmKind::Momcts => "MOMCTSProfiler",
            AlgorithmKind::Meoh => "MEoHProfiler",
            AlgorithmKind::Nsga2 => "NSGA2Profiler",
            AlgorithmKind::Mpage => "EoHProfiler",
            AlgorithmKind::Moead => "MOEADProfiler",
        }
    }

    /// 写在父代程序之后的生成指令
    pub fn directive(self) -> &'static str {
        match self {
            AlgorithmKind::Momcts => {
                "Refine the first heuristic along one concrete direction that should improve \
                 both objectives, keeping what already works."
            }
            AlgorithmKind::Meoh => {
                "Create a new heuristic whose idea differs from all heuristics above \
                 while trading off the two objectives at least as well."
            }
            AlgorithmKind::Nsga2 => {
                "Combine the strongest ideas of the heuristics above into one new heuristic, \
                 then apply a small mutation to it."
            }
            AlgorithmKind::Mpage => {
                "The heuristics above occupy different regions of the Pareto front. \
                 Design a heuristic that fills the gap between them."
            }
            AlgorithmKind::Moead => {
                "Design a heuristic that improves a weighted sum of the two objectives, \
                 giving equal weight to each."
            }
        }
    }
}

/// 算法描述符
#[derive(Clone)]
pub struct AlgorithmDescriptor {
    method_name: String,
    method: MethodConstructor,
    profiler: ProfilerConstructor,
}

impl AlgorithmDescriptor {
    pub fn new(
        method_name: impl Into<String>,
        method: MethodConstructor,
        profiler: ProfilerConstructor,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            method,
            profiler,
        }
    }

    /// 内置算法：共用 `HeuristicSearch` 与 `RunProfiler`
    pub fn builtin(kind: AlgorithmKind) -> Self {
        Self::new(
            kind.method_name(),
            Arc::new(move |config: MethodConfig| -> Result<Box<dyn Method>, MethodError> {
                let method: Box<dyn Method> = Box::new(HeuristicSearch::new(kind, config)?);
                Ok(method)
            }),
            Arc::new(
                move |settings: ProfilerSettings| -> Result<Arc<dyn Profiler>, ProfilerError> {
                    let profiler: Arc<dyn Profiler> =
                        Arc::new(RunProfiler::create(settings, kind.profiler_name())?);
                    Ok(profiler)
                },
            ),
        )
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn construct_method(&self, config: MethodConfig) -> Result<Box<dyn Method>, MethodError> {
        (self.method)(config)
    }

    pub fn construct_profiler(
        &self,
        settings: ProfilerSettings,
    ) -> Result<Arc<dyn Profiler>, ProfilerError> {
        (self.profiler)(settings)
    }
}

impl std::fmt::Debug for AlgorithmDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmDescriptor")
            .field("method_name", &self.method_name)
            .finish_non_exhaustive()
    }
}

/// 内置算法表
pub fn builtin_algorithms() -> Vec<(String, AlgorithmDescriptor)> {
    AlgorithmKind::all()
        .map(|(id, kind)| (id.to_string(), AlgorithmDescriptor::builtin(kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_round_trips_ids() {
        for (id, kind) in AlgorithmKind::all() {
            assert_eq!(kind.id(), id);
            assert_eq!(AlgorithmKind::from_id(id), Some(kind));
        }
        assert_eq!(AlgorithmKind::all().count(), 5);
        assert_eq!(AlgorithmKind::from_id("eoh"), None);
    }

    #[test]
    fn test_mpage_uses_eoh_profiler() {
        assert_eq!(AlgorithmKind::Mpage.method_name(), "MPaGE");
        assert_eq!(AlgorithmKind::Mpage.profiler_name(), "EoHProfiler");
    }

    #[test]
    fn test_builtin_profiler_constructor_creates_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = AlgorithmDescriptor::builtin(AlgorithmKind::Moead);

        let profiler = descriptor
            .construct_profiler(ProfilerSettings {
                log_dir: root.path().join("moead/bi_kp"),
                log_style: crate::services::LogStyle::Simple,
                result_folder: "v1".to_string(),
            })
            .unwrap();

        assert_eq!(descriptor.method_name(), "MOEAD");
        assert!(profiler.output_dir().is_dir());
    }
}

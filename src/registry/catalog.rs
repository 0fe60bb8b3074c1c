//! 注册表目录
//!
//! 组合算法、任务、边界三张表。两张问题相关的表各自维护，可能不同步：
//! 构造时拒绝没有对应任务的边界；没有边界的任务在运行时报 `MissingBounds`。

use crate::config::Config;
use crate::error::{AppError, AppResult, RegistryError};
use crate::registry::algorithms::builtin_algorithms;
use crate::registry::bounds::builtin_bounds;
use crate::registry::tasks::builtin_tasks;
use crate::registry::{AlgorithmDescriptor, BoundPair, Registry, TaskDescriptor};

#[derive(Debug)]
pub struct Catalog {
    algorithms: Registry<AlgorithmDescriptor>,
    tasks: Registry<TaskDescriptor>,
    bounds: Registry<BoundPair>,
}

impl Catalog {
    pub fn new(
        algorithms: Registry<AlgorithmDescriptor>,
        tasks: Registry<TaskDescriptor>,
        bounds: Registry<BoundPair>,
    ) -> Result<Self, RegistryError> {
        let orphans: Vec<String> = bounds
            .ids()
            .into_iter()
            .filter(|id| !tasks.contains(id))
            .collect();
        if !orphans.is_empty() {
            return Err(RegistryError::OrphanBounds { ids: orphans });
        }

        Ok(Self {
            algorithms,
            tasks,
            bounds,
        })
    }

    /// 从条目列表构造
    pub fn from_entries(
        algorithms: Vec<(String, AlgorithmDescriptor)>,
        tasks: Vec<(String, TaskDescriptor)>,
        bounds: Vec<(String, BoundPair)>,
    ) -> Result<Self, RegistryError> {
        Self::new(
            Registry::from_entries("algorithm", algorithms)?,
            Registry::from_entries("task", tasks)?,
            Registry::from_entries("bound", bounds)?,
        )
    }

    /// 内置目录：5 个算法、3 个问题、配置覆盖后的边界
    pub fn builtin(config: &Config) -> AppResult<Self> {
        let catalog = Self::from_entries(
            builtin_algorithms(),
            builtin_tasks(&config.evaluator),
            builtin_bounds(&config.bounds)?,
        )?;
        Ok(catalog)
    }

    pub fn algorithm(&self, id: &str) -> AppResult<&AlgorithmDescriptor> {
        self.algorithms
            .lookup(id)
            .map_err(|_| AppError::UnknownAlgorithm {
                id: id.to_string(),
                known: self.algorithms.ids(),
            })
    }

    pub fn task(&self, id: &str) -> AppResult<&TaskDescriptor> {
        self.tasks.lookup(id).map_err(|_| AppError::UnknownProblem {
            id: id.to_string(),
            known: self.tasks.ids(),
        })
    }

    pub fn bounds(&self, problem: &str) -> AppResult<BoundPair> {
        self.bounds
            .lookup(problem)
            .copied()
            .map_err(|_| AppError::MissingBounds {
                problem: problem.to_string(),
            })
    }

    /// 已注册但没有边界的任务
    pub fn unbounded_tasks(&self) -> Vec<String> {
        self.tasks
            .ids()
            .into_iter()
            .filter(|id| !self.bounds.contains(id))
            .collect()
    }

    pub fn algorithm_ids(&self) -> Vec<String> {
        self.algorithms.ids()
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.ids()
    }
}

//! 任务注册表
//!
//! 问题名 → 评估器实例。评估器对编排层是不透明的，只原样交给方法。

use std::sync::Arc;

use crate::config::EvaluatorSettings;
use crate::services::{Evaluation, ScriptEvaluation};

/// (问题名, 问题描述)
const BUILTIN_TASKS: [(&str, &str); 3] = [
    (
        "tsp_semo",
        "Bi-objective traveling salesman problem: every city has two coordinate sets and \
         both total tour lengths are minimized. Design the neighborhood-selection heuristic \
         used by a Pareto local search (SEMO) to pick and perturb a tour from the archive.",
    ),
    (
        "bi_kp",
        "Bi-objective 0/1 knapsack problem: every item has a weight and two profit values, \
         and both total profits are maximized under one capacity. Design the heuristic that \
         selects a solution from the archive and builds a neighbor by flipping items.",
    ),
    (
        "bi_cvrp",
        "Bi-objective capacitated vehicle routing problem: minimize total travel distance \
         and the length of the longest route. Design the heuristic that selects a solution \
         from the archive and applies a route-improving move.",
    ),
];

/// 任务描述符
#[derive(Clone)]
pub struct TaskDescriptor {
    evaluation: Arc<dyn Evaluation>,
}

impl TaskDescriptor {
    pub fn new(evaluation: Arc<dyn Evaluation>) -> Self {
        Self { evaluation }
    }

    pub fn evaluation(&self) -> Arc<dyn Evaluation> {
        self.evaluation.clone()
    }
}

impl std::fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("task_id", &self.evaluation.task_id())
            .finish()
    }
}

/// 内置任务表，评估脚本为 `{task_dir}/{task}.py`
pub fn builtin_tasks(settings: &EvaluatorSettings) -> Vec<(String, TaskDescriptor)> {
    BUILTIN_TASKS
        .iter()
        .map(|(id, description)| {
            let evaluation = ScriptEvaluation::new(
                *id,
                *description,
                settings.command.clone(),
                settings.task_dir.join(format!("{id}.py")),
                settings.timeout(),
            );
            (id.to_string(), TaskDescriptor::new(Arc::new(evaluation)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_builtin_tasks() {
        let tasks = builtin_tasks(&EvaluatorSettings::default());
        let ids: Vec<&str> = tasks.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["tsp_semo", "bi_kp", "bi_cvrp"]);

        for (id, task) in &tasks {
            assert_eq!(task.evaluation().task_id(), id);
            assert!(!task.evaluation().description().is_empty());
        }
    }

    #[test]
    fn test_script_path_follows_task_dir() {
        let settings = EvaluatorSettings {
            task_dir: PathBuf::from("/opt/tasks"),
            ..Default::default()
        };
        let evaluation = ScriptEvaluation::new(
            "bi_kp",
            "demo",
            settings.command.clone(),
            settings.task_dir.join("bi_kp.py"),
            settings.timeout(),
        );
        assert_eq!(evaluation.script(), &PathBuf::from("/opt/tasks/bi_kp.py"));
        assert_eq!(builtin_tasks(&settings).len(), 3);
    }
}

//! 候选程序评估服务 - 业务能力层
//!
//! 只负责"给一个候选程序打双目标分"，不关心搜索流程。
//! 内置实现把程序交给外部评估脚本，通过标准输入/输出通信。

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::EvaluationError;

/// 双目标评估能力
///
/// 方法会在多个评估任务中并发调用同一个实例。
#[async_trait]
pub trait Evaluation: Send + Sync {
    /// 问题标识符
    fn task_id(&self) -> &str;

    /// 给 LLM 的问题描述
    fn description(&self) -> &str;

    /// 评估候选程序
    ///
    /// `Ok(None)` 表示程序可运行但结果不可行。
    async fn evaluate_program(&self, program: &str) -> Result<Option<[f64; 2]>, EvaluationError>;
}

/// 通过外部脚本评估的任务
#[derive(Debug, Clone)]
pub struct ScriptEvaluation {
    task_id: String,
    description: String,
    command: String,
    script: PathBuf,
    timeout: Duration,
}

impl ScriptEvaluation {
    pub fn new(
        task_id: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
        script: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            description: description.into(),
            command: command.into(),
            script: script.into(),
            timeout,
        }
    }

    pub fn script(&self) -> &PathBuf {
        &self.script
    }

    async fn run_script(&self, program: &str) -> Result<std::process::Output, EvaluationError> {
        let spawn_failed = |source| EvaluationError::SpawnFailed {
            command: format!("{} {}", self.command, self.script.display()),
            source,
        };

        let mut child = Command::new(&self.command)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_failed)?;

        let stdin = child.stdin.take();
        let io = async move {
            if let Some(mut pipe) = stdin {
                match pipe.write_all(program.as_bytes()).await {
                    Ok(()) => {}
                    // 脚本没有读完输入就退出，仍以其输出为准
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    Err(source) => return Err(EvaluationError::PipeFailed { source }),
                }
                // 关闭 stdin，脚本才能读到 EOF
                drop(pipe);
            }
            child
                .wait_with_output()
                .await
                .map_err(|source| EvaluationError::PipeFailed { source })
        };

        // 写入与等待共用一个超时；超时后 child 被 drop，进程随之被杀掉
        match tokio::time::timeout(self.timeout, io).await {
            Ok(output) => output,
            Err(_) => Err(EvaluationError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl Evaluation for ScriptEvaluation {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn evaluate_program(&self, program: &str) -> Result<Option<[f64; 2]>, EvaluationError> {
        let output = self.run_script(program).await?;

        if !output.status.success() {
            return Err(EvaluationError::ScriptFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let score = parse_score_line(&stdout)?;
        debug!("[{}] 评估结果: {:?}", self.task_id, score);

        Ok(score)
    }
}

/// 解析评估脚本最后一行非空输出
///
/// 接受 `[f1, f2]` 或 `null`；非有限数值视为不可行。
pub fn parse_score_line(stdout: &str) -> Result<Option<[f64; 2]>, EvaluationError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| EvaluationError::BadOutput {
            output: String::new(),
        })?;

    let bad_output = || EvaluationError::BadOutput {
        output: line.to_string(),
    };

    let value: Option<Vec<f64>> = serde_json::from_str(line).map_err(|_| bad_output())?;
    match value {
        None => Ok(None),
        Some(values) if values.len() == 2 => {
            if values.iter().all(|v| v.is_finite()) {
                Ok(Some([values[0], values[1]]))
            } else {
                Ok(None)
            }
        }
        Some(_) => Err(bad_output()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_last_line() {
        let stdout = "loading instances...\n[-0.82, 1.5]\n\n";
        assert_eq!(parse_score_line(stdout).unwrap(), Some([-0.82, 1.5]));
    }

    #[test]
    fn test_parse_null_is_infeasible() {
        assert_eq!(parse_score_line("null").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert!(matches!(
            parse_score_line("[1.0, 2.0, 3.0]"),
            Err(EvaluationError::BadOutput { .. })
        ));
        assert!(matches!(
            parse_score_line("done"),
            Err(EvaluationError::BadOutput { .. })
        ));
        assert!(matches!(
            parse_score_line(""),
            Err(EvaluationError::BadOutput { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error() {
        let evaluation = ScriptEvaluation::new(
            "bi_kp",
            "demo",
            "definitely-not-an-interpreter-7f3a",
            "tasks/bi_kp.py",
            Duration::from_secs(1),
        );

        let result = evaluation.evaluate_program("pass").await;
        assert!(matches!(result, Err(EvaluationError::SpawnFailed { .. })));
    }

    #[cfg(unix)]
    fn shell_task(body: &str) -> (tempfile::TempDir, ScriptEvaluation) {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bi_kp.sh");
        std::fs::write(&script, body).unwrap();
        let evaluation =
            ScriptEvaluation::new("bi_kp", "demo", "sh", script, Duration::from_millis(500));
        (dir, evaluation)
    }

    #[cfg(unix)]
    #[test]
    fn test_script_reads_program_from_stdin() {
        let (_dir, evaluation) =
            shell_task("grep -q 'def select' && echo '[-0.5, 2.0]' || echo null\n");

        let feasible = tokio_test::block_on(evaluation.evaluate_program("def select(a): pass"));
        assert_eq!(feasible.unwrap(), Some([-0.5, 2.0]));

        let infeasible = tokio_test::block_on(evaluation.evaluate_program("x = 1"));
        assert_eq!(infeasible.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_failure_and_timeout() {
        let (_dir, failing) = shell_task("cat > /dev/null; echo oops >&2; exit 3\n");
        match failing.evaluate_program("pass").await {
            Err(EvaluationError::ScriptFailed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("意外的结果: {other:?}"),
        }

        let (_dir, slow) = shell_task("cat > /dev/null; sleep 5; echo null\n");
        assert!(matches!(
            slow.evaluate_program("pass").await,
            Err(EvaluationError::Timeout { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_covers_blocked_stdin() {
        let (_dir, evaluation) = shell_task("sleep 4; echo null\n");
        let program = "x".repeat(1 << 20);

        let started = std::time::Instant::now();
        let result = evaluation.evaluate_program(&program).await;

        assert!(
            matches!(result, Err(EvaluationError::Timeout { .. })),
            "意外的结果: {result:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unread_stdin_still_scored() {
        let (_dir, evaluation) = shell_task("echo '[1.0, 2.0]'\n");
        let program = "x".repeat(1 << 20);

        assert_eq!(
            evaluation.evaluate_program(&program).await.unwrap(),
            Some([1.0, 2.0])
        );
    }
}

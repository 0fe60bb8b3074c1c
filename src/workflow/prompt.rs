//! 提示词构建与程序提取

use regex::Regex;

use crate::registry::AlgorithmKind;
use crate::services::ParetoEntry;

/// 构建一次采样的提示词
///
/// 包含问题描述、算法指令，以及带得分的父代程序（第一代没有父代）。
pub fn build_prompt(kind: AlgorithmKind, description: &str, parents: &[ParetoEntry]) -> String {
    let mut prompt = format!("{}\n\n", description.trim());

    if parents.is_empty() {
        prompt.push_str(
            "Design a first heuristic for this problem. \
             Return only the Python function in a ```python code block.\n",
        );
        return prompt;
    }

    prompt.push_str(&format!(
        "Here are {} existing heuristics with their normalized objective values \
         (both minimized):\n\n",
        parents.len()
    ));
    for (i, parent) in parents.iter().enumerate() {
        prompt.push_str(&format!(
            "No.{} heuristic, objectives = [{:.4}, {:.4}]:\n```python\n{}\n```\n\n",
            i + 1,
            parent.normalized[0],
            parent.normalized[1],
            parent.program.trim()
        ));
    }

    prompt.push_str(kind.directive());
    prompt.push_str("\nReturn only the Python function in a ```python code block.\n");
    prompt
}

/// 从 LLM 响应中提取程序
///
/// 优先取第一个代码块；没有代码块但包含函数定义时取全文。
pub fn extract_program(response: &str) -> Option<String> {
    if let Ok(re) = Regex::new(r"(?s)```(?:python|py)?[ \t]*\r?\n(.*?)```") {
        if let Some(caps) = re.captures(response) {
            let code = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            return (!code.is_empty()).then(|| code.to_string());
        }
    }

    let trimmed = response.trim();
    (trimmed.contains("def ")).then(|| trimmed.to_string())
}

//! 注册表层（Registry Layer）
//!
//! ## 职责
//!
//! 把配置里的符号名映射到具体协作者：
//!
//! - `algorithms` - 算法名 → (方法构造器, Profiler 构造器)
//! - `tasks` - 问题名 → 评估器实例
//! - `bounds` - 问题名 → 双目标归一化边界
//! - `catalog` - 三张表的组合，启动时做跨表一致性检查
//!
//! 所有注册表构造后不可变，查询失败一律返回 `UnknownIdentifier`。

pub mod algorithms;
pub mod bounds;
pub mod catalog;
pub mod tasks;

use std::collections::BTreeMap;

use crate::error::RegistryError;

pub use algorithms::{AlgorithmDescriptor, AlgorithmKind, MethodConstructor, ProfilerConstructor};
pub use bounds::{BoundPair, BoundPairSpec};
pub use catalog::Catalog;
pub use tasks::TaskDescriptor;

/// 不可变的 标识符 → 描述符 映射
pub struct Registry<D> {
    name: &'static str,
    entries: BTreeMap<String, D>,
}

impl<D> Registry<D> {
    /// 从条目列表构造注册表
    ///
    /// 标识符为空或重复时返回错误，而不是让后者覆盖前者。
    pub fn from_entries<I, K>(name: &'static str, entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (id, descriptor) in entries {
            let id = id.into();
            if id.trim().is_empty() {
                return Err(RegistryError::EmptyIdentifier { registry: name });
            }
            if map.contains_key(&id) {
                return Err(RegistryError::DuplicateIdentifier { registry: name, id });
            }
            map.insert(id, descriptor);
        }

        Ok(Self { name, entries: map })
    }

    /// 查询描述符
    pub fn lookup(&self, id: &str) -> Result<&D, RegistryError> {
        self.entries
            .get(id)
            .ok_or_else(|| RegistryError::UnknownIdentifier {
                registry: self.name,
                id: id.to_string(),
                known: self.ids(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 所有标识符（有序）
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl<D> std::fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("ids", &self.ids())
            .finish()
    }
}

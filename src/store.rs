//! 已处理任务的持久化存储
//!
//! 单文件 JSON：标题 → {description, solution, processed_at}，人类可读。
//! 记录只增不改：已存在的标识永远不会被后续巡查覆盖或重新处理，
//! 因此任务描述被编辑后不会被再次检测（已知限制）。
//!
//! save 采用「写临时文件 + rename」保证崩溃原子性：进程在保存途中被杀，
//! 磁盘上要么是旧的完整状态，要么是新的完整状态，不会出现半个文件。

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::task::{TaskId, TaskRecord};

/// 存储层错误：介质不可写视为本轮致命（结果丢弃、下轮重试），但进程继续
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 文件中的记录形态（键是标题，故不含 id）
#[derive(serde::Serialize, serde::Deserialize)]
struct StoredRecord {
    description: String,
    solution: String,
    processed_at: DateTime<Utc>,
}

/// 持久化记录存储：内存映射 + 磁盘 JSON 文件
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    records: HashMap<TaskId, TaskRecord>,
}

impl RecordStore {
    /// 从 JSON 文件加载；文件不存在时返回空存储（首次运行），不报错
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                records: HashMap::new(),
            });
        }
        let data = std::fs::read_to_string(&path)?;
        let stored: BTreeMap<String, StoredRecord> = serde_json::from_str(&data)?;
        let records = stored
            .into_iter()
            .filter_map(|(title, r)| {
                let id = TaskId::new(&title)?;
                Some((
                    id.clone(),
                    TaskRecord {
                        id,
                        description: r.description,
                        solution: r.solution,
                        processed_at: r.processed_at,
                    },
                ))
            })
            .collect();
        Ok(Self { path, records })
    }

    /// 已知记录的映射（供 reconcile 做新旧判定）
    pub fn records(&self) -> &HashMap<TaskId, TaskRecord> {
        &self.records
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 合并一轮的新记录：仅插入不存在的标识，已有记录绝不覆盖；返回插入条数
    pub fn merge(&mut self, new_records: &[TaskRecord]) -> usize {
        let mut inserted = 0;
        for record in new_records {
            if let std::collections::hash_map::Entry::Vacant(e) =
                self.records.entry(record.id.clone())
            {
                e.insert(record.clone());
                inserted += 1;
            }
        }
        inserted
    }

    /// 撤销一次 save 失败后的内存插入，让这些任务下轮重新处理
    ///
    /// 只对本轮 merge 刚插入的记录调用（reconcile 保证它们此前不在存储中）。
    pub fn rollback(&mut self, records: &[TaskRecord]) {
        for record in records {
            self.records.remove(&record.id);
        }
    }

    /// 原子写盘：先写 `<path>.tmp` 再 rename 到位；父目录不存在时自动创建
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let stored: BTreeMap<&str, StoredRecord> = self
            .records
            .values()
            .map(|r| {
                (
                    r.id.as_str(),
                    StoredRecord {
                        description: r.description.clone(),
                        solution: r.solution.clone(),
                        processed_at: r.processed_at,
                    },
                )
            })
            .collect();
        let data = serde_json::to_string_pretty(&stored)?;

        let tmp = self.tmp_path();
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, solution: &str) -> TaskRecord {
        TaskRecord {
            id: TaskId::new(title).unwrap(),
            description: format!("desc of {}", title),
            solution: solution.to_string(),
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::load(dir.path().join("tareas.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tareas.json");

        let mut store = RecordStore::load(&path).unwrap();
        store.merge(&[record("Essay1", "Answer text")]);
        store.save().unwrap();

        let reloaded = RecordStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        let rec = &reloaded.records()[&TaskId::new("Essay1").unwrap()];
        assert_eq!(rec.solution, "Answer text");
        assert_eq!(rec.description, "desc of Essay1");
    }

    #[test]
    fn test_merge_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::load(dir.path().join("tareas.json")).unwrap();

        assert_eq!(store.merge(&[record("Essay1", "first")]), 1);
        assert_eq!(store.merge(&[record("Essay1", "second")]), 0);

        let rec = &store.records()[&TaskId::new("Essay1").unwrap()];
        assert_eq!(rec.solution, "first");
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tareas.json");

        let mut store = RecordStore::load(&path).unwrap();
        store.merge(&[record("Essay1", "answer")]);
        store.save().unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("tareas.json.tmp").exists());
    }

    #[test]
    fn test_save_survives_stale_tmp_from_crashed_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tareas.json");
        // 模拟上次保存中途崩溃留下的残缺临时文件
        std::fs::write(dir.path().join("tareas.json.tmp"), "{\"trunc").unwrap();

        let mut store = RecordStore::load(&path).unwrap();
        store.merge(&[record("Essay1", "answer")]);
        store.save().unwrap();

        let reloaded = RecordStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_save_fails_when_medium_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        // 父路径是普通文件，目录无法创建，save 必须报 IO 错误而不是半写
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut store = RecordStore::load(blocker.join("tareas.json")).unwrap();
        store.merge(&[record("Essay1", "answer")]);
        assert!(matches!(store.save(), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_rollback_makes_tasks_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::load(dir.path().join("tareas.json")).unwrap();

        let records = vec![record("Essay1", "answer")];
        assert_eq!(store.merge(&records), 1);
        store.rollback(&records);

        assert!(!store.contains(&TaskId::new("Essay1").unwrap()));
        // 回滚后同一任务可再次合并（下轮重试）
        assert_eq!(store.merge(&records), 1);
    }

    #[test]
    fn test_file_is_keyed_by_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tareas.json");

        let mut store = RecordStore::load(&path).unwrap();
        store.merge(&[record("Essay1", "answer")]);
        store.save().unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert!(json.get("Essay1").is_some());
        assert_eq!(json["Essay1"]["solution"], "answer");
    }
}

//! 任务对账：观察行 vs 已处理存储
//!
//! 纯函数：对同样的输入永远给出同样的输出，无任何副作用。
//! 「新任务」的唯一判据是标识不在存储中；排序保持输入顺序（稳定过滤，不排序）。

use std::collections::{HashMap, HashSet};

use crate::task::{TaskId, TaskObservation, TaskRecord};

/// 过滤出本轮需要处理的新任务行
///
/// 丢弃规则（防畸形抓取行）：
/// - 标题空白（算不出标识）
/// - 描述空白且无链接（Pipeline 既拿不到正文也无处补抓）
/// - 同批次内重复标识只保留首个
pub fn reconcile(
    observations: &[TaskObservation],
    known: &HashMap<TaskId, TaskRecord>,
) -> Vec<TaskObservation> {
    let mut seen: HashSet<TaskId> = HashSet::new();
    let mut fresh = Vec::new();

    for obs in observations {
        let Some(id) = obs.id() else {
            continue;
        };
        if obs.description.trim().is_empty() && obs.link.is_none() {
            continue;
        }
        if known.contains_key(&id) {
            continue;
        }
        if !seen.insert(id) {
            continue;
        }
        fresh.push(obs.clone());
    }

    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn obs(title: &str, description: &str) -> TaskObservation {
        TaskObservation {
            title: title.to_string(),
            description: description.to_string(),
            link: None,
        }
    }

    fn obs_with_link(title: &str, link: &str) -> TaskObservation {
        TaskObservation {
            title: title.to_string(),
            description: String::new(),
            link: Some(link.to_string()),
        }
    }

    fn known(titles: &[&str]) -> HashMap<TaskId, TaskRecord> {
        titles
            .iter()
            .map(|t| {
                let id = TaskId::new(t).unwrap();
                (
                    id.clone(),
                    TaskRecord {
                        id,
                        description: "d".into(),
                        solution: "s".into(),
                        processed_at: Utc::now(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_only_unknown_ids_pass() {
        let observations = vec![obs("Essay1", "write about X"), obs("Essay2", "write about Y")];
        let fresh = reconcile(&observations, &known(&["Essay1"]));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].title, "Essay2");
    }

    #[test]
    fn test_preserves_input_order() {
        let observations = vec![obs("C", "c"), obs("A", "a"), obs("B", "b")];
        let fresh = reconcile(&observations, &HashMap::new());
        let titles: Vec<&str> = fresh.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_blank_title_is_skipped() {
        let observations = vec![obs("   ", "orphan"), obs("Essay1", "x")];
        let fresh = reconcile(&observations, &HashMap::new());
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].title, "Essay1");
    }

    #[test]
    fn test_blank_description_without_link_is_skipped() {
        let observations = vec![obs("Essay1", "  "), obs_with_link("Essay2", "/c/x/a/1")];
        let fresh = reconcile(&observations, &HashMap::new());
        // 无正文无链接的行被丢弃；有链接的占位行留给 Pipeline 补抓
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].title, "Essay2");
    }

    #[test]
    fn test_batch_duplicates_keep_first() {
        let observations = vec![obs("Essay1", "first"), obs("Essay1", "second")];
        let fresh = reconcile(&observations, &HashMap::new());
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].description, "first");
    }

    #[test]
    fn test_title_is_trimmed_for_identity() {
        let observations = vec![obs("  Essay1  ", "x")];
        let fresh = reconcile(&observations, &known(&["Essay1"]));
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_pure_same_input_same_output() {
        let observations = vec![obs("A", "a"), obs("B", "b"), obs("A", "dup")];
        let store = known(&["B"]);
        let first: Vec<String> = reconcile(&observations, &store)
            .iter()
            .map(|o| o.title.clone())
            .collect();
        let second: Vec<String> = reconcile(&observations, &store)
            .iter()
            .map(|o| o.title.clone())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["A".to_string()]);
    }
}

// 解题历史记录
// 最新在前，最多保留 20 条，每次变更整体序列化写回存储

use crate::models::{ExerciseSolution, HistoryItem};
use crate::services::storage::KeyValueStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// 存储键
pub const HISTORY_KEY: &str = "edusolve_v8_history";

/// 历史记录上限
pub const HISTORY_CAPACITY: usize = 20;

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    /// 从存储加载历史记录
    ///
    /// 缺失或损坏的数据视为空历史，不向上报错。
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(mut items) => {
                    items.truncate(HISTORY_CAPACITY);
                    items
                }
                Err(e) => {
                    log::warn!("Discarding corrupt history: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read history: {:#}", e);
                Vec::new()
            }
        };

        log::info!("Loaded {} history item(s)", items.len());
        Self { store, items }
    }

    /// 追加一条记录并持久化
    pub fn append(&mut self, image: Option<String>, solution: ExerciseSolution) -> Result<HistoryItem> {
        let item = HistoryItem {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            image: image.unwrap_or_default(),
            solution,
        };

        self.items.insert(0, item.clone());
        self.items.truncate(HISTORY_CAPACITY);
        self.persist()?;

        Ok(item)
    }

    fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string(&self.items).context("Failed to serialize history")?;
        self.store
            .set(HISTORY_KEY, &serialized)
            .context("Failed to persist history")
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_solution;
    use crate::services::storage::MemoryStore;

    fn solution_with_idea(idea: &str) -> ExerciseSolution {
        let mut solution = sample_solution(1, 1);
        solution.main_idea = idea.to_string();
        solution
    }

    #[test]
    fn test_newest_first_and_capped() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut history = HistoryStore::load(store.clone());

        for i in 0..(HISTORY_CAPACITY + 5) {
            history
                .append(None, solution_with_idea(&format!("idea {}", i)))
                .unwrap();
            assert!(history.len() <= HISTORY_CAPACITY);
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.items()[0].solution.main_idea, "idea 24");
        assert_eq!(history.items()[HISTORY_CAPACITY - 1].solution.main_idea, "idea 5");

        let persisted: Vec<HistoryItem> =
            serde_json::from_str(&store.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), HISTORY_CAPACITY);
        assert_eq!(persisted[0].id, history.items()[0].id);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut history = HistoryStore::load(Arc::new(MemoryStore::new()));
        let a = history.append(None, sample_solution(1, 1)).unwrap();
        let b = history.append(None, sample_solution(1, 1)).unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.timestamp >= a.timestamp);
        assert_eq!(history.get(&a.id).unwrap().id, a.id);
    }

    #[test]
    fn test_image_defaults_to_empty() {
        let mut history = HistoryStore::load(Arc::new(MemoryStore::new()));
        let concept = history.append(None, sample_solution(1, 1)).unwrap();
        let photo = history
            .append(Some("data:image/png;base64,AAAA".to_string()), sample_solution(1, 1))
            .unwrap();
        assert_eq!(concept.image, "");
        assert_eq!(photo.image, "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_reload_restores_items() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut history = HistoryStore::load(store.clone());
        history.append(None, solution_with_idea("first")).unwrap();
        history.append(None, solution_with_idea("second")).unwrap();

        let reloaded = HistoryStore::load(store);
        assert_eq!(reloaded.items(), history.items());
        assert_eq!(reloaded.items()[0].solution.main_idea, "second");
    }

    #[test]
    fn test_corrupt_value_is_treated_as_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "{not json").unwrap();

        let mut history = HistoryStore::load(store.clone());
        assert!(history.is_empty());

        history.append(None, sample_solution(1, 1)).unwrap();
        let persisted = store.get(HISTORY_KEY).unwrap().unwrap();
        assert!(serde_json::from_str::<Vec<HistoryItem>>(&persisted).is_ok());
    }
}

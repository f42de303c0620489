//! Local editing of one ordered list with on-demand wholesale sync.
//!
//! All list mutations are synchronous and in-memory. Only [`ListEditor::load`]
//! and [`ListEditor::save`] touch the store; neither retries on failure.
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{Config, Resource};
use crate::model::{Direction, Item, ItemId};
use crate::payload::{ContentSection, FaqEntry, FieldError, ItemPayload, PopularPost};
use crate::store::{ListStore, SaveRequest, StoredList, UploadPart};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("list is still loading")]
    NotReady,
    #[error("no item with id {0}")]
    UnknownItem(String),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("failed to load {container}: {message}")]
    Fetch { container: String, message: String },
    #[error("failed to save {container}: {message}")]
    Save { container: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    Ready,
}

/// What `remove_item` does when the last item goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Insert a fresh default item so the list never becomes empty.
    Refill,
    AllowEmpty,
}

/// What `update_optimistic` does with the local edit when the save fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertPolicy {
    Revert,
    Keep,
}

pub struct ListEditor<P: ItemPayload> {
    store: Arc<dyn ListStore>,
    resource: Resource,
    empty_policy: EmptyPolicy,
    state: EditorState,
    container_key: String,
    record_id: Option<String>,
    items: Vec<Item<P>>,
}

impl<P: ItemPayload> std::fmt::Debug for ListEditor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEditor")
            .field("resource", &self.resource.path)
            .field("state", &self.state)
            .field("container_key", &self.container_key)
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl ListEditor<FaqEntry> {
    pub fn faq(store: Arc<dyn ListStore>, cfg: &Config) -> Self {
        Self::new(store, cfg.resources.faq.clone(), EmptyPolicy::Refill)
    }
}

impl ListEditor<PopularPost> {
    pub fn popular_posts(store: Arc<dyn ListStore>, cfg: &Config) -> Self {
        Self::new(store, cfg.resources.popular_posts.clone(), EmptyPolicy::AllowEmpty)
    }
}

impl ListEditor<ContentSection> {
    pub fn flexible_content(store: Arc<dyn ListStore>, cfg: &Config) -> Self {
        Self::new(store, cfg.resources.flexible_content.clone(), EmptyPolicy::Refill)
    }
}

impl<P: ItemPayload> ListEditor<P> {
    pub fn new(store: Arc<dyn ListStore>, resource: Resource, empty_policy: EmptyPolicy) -> Self {
        Self {
            store,
            resource,
            empty_policy,
            state: EditorState::Loading,
            container_key: String::new(),
            record_id: None,
            items: Vec::new(),
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn container_key(&self) -> &str {
        &self.container_key
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn items(&self) -> &[Item<P>] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item<P>> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    fn ensure_ready(&self) -> Result<(), EditorError> {
        match self.state {
            EditorState::Ready => Ok(()),
            EditorState::Loading => Err(EditorError::NotReady),
        }
    }

    fn index_of(&self, id: &str) -> Result<usize, EditorError> {
        self.items
            .iter()
            .position(|item| item.id.as_str() == id)
            .ok_or_else(|| EditorError::UnknownItem(id.to_string()))
    }

    fn default_items() -> Vec<Item<P>> {
        vec![Item::new(P::default())]
    }

    fn refill_if_empty(&mut self) {
        if self.items.is_empty() && self.empty_policy == EmptyPolicy::Refill {
            self.items = Self::default_items();
        }
    }

    fn decode(&self, stored: StoredList) -> Result<Vec<Item<P>>, serde_json::Error> {
        stored
            .sequence
            .into_iter()
            .map(|obj| Item::from_wire(obj, &self.resource.id_field))
            .collect()
    }

    /// Fetch the stored list for `container_key` and make it the local state.
    ///
    /// A missing record yields a single default item. Any other failure is
    /// returned; local state is kept if a list was already loaded, otherwise
    /// the editor falls back to a single default item so it stays usable.
    #[instrument(skip(self), fields(resource = %self.resource.path))]
    pub async fn load(&mut self, container_key: &str) -> Result<(), EditorError> {
        let fetched = self
            .store
            .fetch(&self.resource, container_key)
            .await
            .and_then(|found| match found {
                Some(stored) => {
                    let record_id = stored.record_id.clone();
                    let items = self.decode(stored)?;
                    Ok(Some((record_id, items)))
                }
                None => Ok(None),
            });

        match fetched {
            Ok(Some((record_id, items))) => {
                info!(items = items.len(), "list loaded");
                self.items = items;
                self.refill_if_empty();
                self.record_id = record_id;
            }
            Ok(None) => {
                info!("no stored list, starting with a default item");
                self.items = Self::default_items();
                self.record_id = None;
            }
            Err(err) => {
                warn!(?err, "failed to load list");
                if self.state == EditorState::Loading {
                    self.items = Self::default_items();
                    self.record_id = None;
                    self.container_key = container_key.to_string();
                    self.state = EditorState::Ready;
                }
                return Err(EditorError::Fetch {
                    container: container_key.to_string(),
                    message: format!("{:#}", err),
                });
            }
        }
        self.container_key = container_key.to_string();
        self.state = EditorState::Ready;
        Ok(())
    }

    /// Append a new item; returns its placeholder id.
    pub fn add_item(&mut self, payload: P) -> Result<ItemId, EditorError> {
        self.ensure_ready()?;
        let item = Item::new(payload);
        let id = item.id.clone();
        self.items.push(item);
        Ok(id)
    }

    pub fn remove_item(&mut self, id: &str) -> Result<Item<P>, EditorError> {
        self.ensure_ready()?;
        let index = self.index_of(id)?;
        let removed = self.items.remove(index);
        self.refill_if_empty();
        Ok(removed)
    }

    /// Swap the item with its neighbour. No-op at the boundary.
    pub fn move_item(&mut self, id: &str, direction: Direction) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let index = self.index_of(id)?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.items.len() => index + 1,
            _ => return Ok(()),
        };
        self.items.swap(index, target);
        Ok(())
    }

    /// Move the item to `destination` (clamped to the end), shifting the
    /// items in between.
    pub fn move_to(&mut self, id: &str, destination: usize) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let index = self.index_of(id)?;
        let item = self.items.remove(index);
        let destination = destination.min(self.items.len());
        self.items.insert(destination, item);
        Ok(())
    }

    pub fn update_item(&mut self, id: &str, field: &str, value: Value) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let index = self.index_of(id)?;
        self.items[index].payload.set_field(field, value)?;
        Ok(())
    }

    /// Replace the whole local sequence, e.g. with items read from a file.
    pub fn replace_items(&mut self, items: Vec<Item<P>>) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.items = items;
        self.refill_if_empty();
        Ok(())
    }

    /// The request `save` would send for the current local state.
    pub fn outgoing(&self) -> Result<SaveRequest, EditorError> {
        self.ensure_ready()?;
        let save_error = |message: String| EditorError::Save {
            container: self.container_key.clone(),
            message,
        };

        let mut sequence = Vec::with_capacity(self.items.len());
        let mut uploads = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            let wire = item
                .to_wire(&self.resource.id_field)
                .map_err(|err| save_error(format!("failed to encode item {}: {}", item.id, err)))?;
            sequence.push(wire);
            uploads.extend(item.payload.uploads().into_iter().map(|upload| UploadPart {
                name: format!("sequence[{}][{}]", index, upload.field),
                path: upload.path,
            }));
        }

        Ok(SaveRequest {
            container_key: self.container_key.clone(),
            record_id: self.record_id.clone(),
            sequence,
            uploads,
        })
    }

    /// Send the full local sequence as a wholesale replacement. On success the
    /// local state becomes the backend's echo; on failure it is left as is.
    #[instrument(skip(self), fields(resource = %self.resource.path, key = %self.container_key))]
    pub async fn save(&mut self) -> Result<(), EditorError> {
        let request = self.outgoing()?;
        let save_error = |message: String| EditorError::Save {
            container: request.container_key.clone(),
            message,
        };

        let stored = match self.store.replace(&self.resource, &request).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(?err, "failed to save list");
                return Err(save_error(format!("{:#}", err)));
            }
        };
        let record_id = stored.record_id.clone();
        let items = self
            .decode(stored)
            .map_err(|err| save_error(format!("invalid saved list: {}", err)))?;

        info!(items = items.len(), "list replaced by backend echo");
        self.items = items;
        self.refill_if_empty();
        if record_id.is_some() {
            self.record_id = record_id;
        }
        Ok(())
    }

    /// Apply a field change locally, then save. When the save fails the
    /// change is either reverted or kept, per `policy`.
    pub async fn update_optimistic(
        &mut self,
        id: &str,
        field: &str,
        value: Value,
        policy: RevertPolicy,
    ) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let index = self.index_of(id)?;
        let previous = self.items[index].payload.clone();
        self.items[index].payload.set_field(field, value)?;

        if let Err(err) = self.save().await {
            if policy == RevertPolicy::Revert {
                if let Some(item) = self.items.iter_mut().find(|item| item.id.as_str() == id) {
                    item.payload = previous;
                }
            }
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    /// Store that is never reached; mutations are purely local.
    struct Unreachable;

    #[async_trait]
    impl ListStore for Unreachable {
        async fn fetch(&self, _: &Resource, _: &str) -> Result<Option<StoredList>> {
            Err(anyhow!("offline"))
        }

        async fn replace(&self, _: &Resource, _: &SaveRequest) -> Result<StoredList> {
            Err(anyhow!("offline"))
        }
    }

    fn ready_editor(policy: EmptyPolicy, labels: &[&str]) -> ListEditor<FaqEntry> {
        let mut editor = ListEditor::new(Arc::new(Unreachable), Resource::named("faq"), policy);
        editor.state = EditorState::Ready;
        editor.container_key = "general".into();
        editor.items = labels
            .iter()
            .map(|label| {
                Item::with_id(
                    label,
                    FaqEntry {
                        question: label.to_string(),
                        answer: String::new(),
                    },
                )
            })
            .collect();
        editor
    }

    fn order(editor: &ListEditor<FaqEntry>) -> Vec<&str> {
        editor.items().iter().map(|i| i.payload.question.as_str()).collect()
    }

    #[test]
    fn mutations_require_ready_state() {
        let mut editor: ListEditor<FaqEntry> =
            ListEditor::new(Arc::new(Unreachable), Resource::named("faq"), EmptyPolicy::Refill);
        assert!(matches!(editor.add_item(FaqEntry::default()), Err(EditorError::NotReady)));
        assert!(matches!(editor.move_item("x", Direction::Up), Err(EditorError::NotReady)));
        assert!(matches!(editor.outgoing(), Err(EditorError::NotReady)));
    }

    #[test]
    fn neighbour_swaps_compose() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A", "B", "C"]);
        editor.move_item("B", Direction::Up).unwrap();
        assert_eq!(order(&editor), ["B", "A", "C"]);
        editor.move_item("A", Direction::Down).unwrap();
        assert_eq!(order(&editor), ["B", "C", "A"]);
    }

    #[test]
    fn boundary_moves_are_noops() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A", "B", "C"]);
        editor.move_item("A", Direction::Up).unwrap();
        editor.move_item("C", Direction::Down).unwrap();
        assert_eq!(order(&editor), ["A", "B", "C"]);
    }

    #[test]
    fn drag_move_shifts_items_between() {
        let mut editor = ready_editor(EmptyPolicy::AllowEmpty, &["A", "B", "C", "D"]);
        editor.move_to("A", 2).unwrap();
        assert_eq!(order(&editor), ["B", "C", "A", "D"]);
        editor.move_to("D", 0).unwrap();
        assert_eq!(order(&editor), ["D", "B", "C", "A"]);
        editor.move_to("B", 99).unwrap();
        assert_eq!(order(&editor), ["D", "C", "A", "B"]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A"]);
        assert!(matches!(editor.remove_item("Z"), Err(EditorError::UnknownItem(id)) if id == "Z"));
        assert!(matches!(
            editor.update_item("Z", "question", json!("x")),
            Err(EditorError::UnknownItem(_))
        ));
    }

    #[test]
    fn add_appends_with_placeholder() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A", "B"]);
        let id = editor.add_item(FaqEntry::default()).unwrap();
        assert!(!id.is_persisted());
        assert_eq!(editor.items().last().unwrap().id, id);
        assert_eq!(editor.items().len(), 3);
    }

    #[test]
    fn removing_last_item_refills_or_empties() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A"]);
        editor.remove_item("A").unwrap();
        assert_eq!(editor.items().len(), 1);
        assert_eq!(editor.items()[0].payload, FaqEntry::default());

        let mut editor = ready_editor(EmptyPolicy::AllowEmpty, &["A"]);
        editor.remove_item("A").unwrap();
        assert!(editor.items().is_empty());
    }

    #[test]
    fn update_touches_one_field_of_one_item() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A", "B"]);
        editor.update_item("B", "answer", json!("bee")).unwrap();
        assert_eq!(editor.items()[1].payload.answer, "bee");
        assert_eq!(editor.items()[1].payload.question, "B");
        assert_eq!(editor.items()[0].payload.answer, "");
    }

    #[test]
    fn outgoing_strips_only_placeholder_ids() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["507f1f77bcf86cd799439011", "1699999999123"]);
        editor.record_id = Some("64b000000000000000000009".into());
        let request = editor.outgoing().unwrap();
        assert_eq!(request.container_key, "general");
        assert_eq!(request.record_id.as_deref(), Some("64b000000000000000000009"));
        assert_eq!(request.sequence[0]["_id"], "507f1f77bcf86cd799439011");
        assert!(request.sequence[1].get("_id").is_none());
        assert!(request.uploads.is_empty());
    }

    #[test]
    fn outgoing_names_upload_parts_by_index() {
        let mut editor: ListEditor<ContentSection> = ListEditor::new(
            Arc::new(Unreachable),
            Resource::named("flexible-content"),
            EmptyPolicy::Refill,
        );
        editor.state = EditorState::Ready;
        editor.items = vec![Item::new(ContentSection::default())];
        let id = editor.add_item(ContentSection::default()).unwrap();
        editor
            .update_item(id.as_str(), "imageFile", json!("/tmp/hero.png"))
            .unwrap();

        let request = editor.outgoing().unwrap();
        assert_eq!(request.uploads.len(), 1);
        assert_eq!(request.uploads[0].name, "sequence[1][image]");
        assert!(request.is_multipart());
    }

    #[tokio::test]
    async fn failed_first_load_falls_back_to_default_item() {
        let mut editor: ListEditor<FaqEntry> =
            ListEditor::new(Arc::new(Unreachable), Resource::named("faq"), EmptyPolicy::AllowEmpty);
        let err = editor.load("general").await.unwrap_err();
        assert!(matches!(err, EditorError::Fetch { .. }));
        assert!(err.to_string().contains("offline"));
        assert_eq!(editor.state(), EditorState::Ready);
        assert_eq!(editor.items().len(), 1);
        assert_eq!(editor.container_key(), "general");
    }

    #[tokio::test]
    async fn failed_reload_keeps_prior_state() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A", "B"]);
        assert!(editor.load("other").await.is_err());
        assert_eq!(order(&editor), ["A", "B"]);
        assert_eq!(editor.container_key(), "general");
    }

    #[tokio::test]
    async fn failed_save_keeps_local_edits() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A"]);
        editor.update_item("A", "answer", json!("draft")).unwrap();
        let err = editor.save().await.unwrap_err();
        assert!(matches!(err, EditorError::Save { .. }));
        assert_eq!(editor.items()[0].payload.answer, "draft");
    }

    #[tokio::test]
    async fn optimistic_update_reverts_or_keeps() {
        let mut editor = ready_editor(EmptyPolicy::Refill, &["A"]);
        let err = editor
            .update_optimistic("A", "answer", json!("live"), RevertPolicy::Revert)
            .await;
        assert!(err.is_err());
        assert_eq!(editor.items()[0].payload.answer, "");

        let err = editor
            .update_optimistic("A", "answer", json!("live"), RevertPolicy::Keep)
            .await;
        assert!(err.is_err());
        assert_eq!(editor.items()[0].payload.answer, "live");
    }
}

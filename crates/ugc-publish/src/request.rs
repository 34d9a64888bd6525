//! Inputs of a publish run.

use std::path::PathBuf;

use ugc_platform::{AppId, ItemId};

/// Which item a run targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemIdentity {
    pub app_id: AppId,
    /// Existing item to update. Ignored when `is_new` is set.
    pub item_id: ItemId,
    /// Create a new item and update that one instead.
    pub is_new: bool,
}

impl ItemIdentity {
    /// Update an existing item.
    #[must_use]
    pub fn existing(app_id: AppId, item_id: ItemId) -> Self {
        Self {
            app_id,
            item_id,
            is_new: false,
        }
    }

    /// Create a new item, then update it.
    #[must_use]
    pub fn create(app_id: AppId) -> Self {
        Self {
            app_id,
            item_id: ItemId::UNASSIGNED,
            is_new: true,
        }
    }
}

/// Dependencies to add to and remove from an item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyChanges<T> {
    pub add: Vec<T>,
    pub remove: Vec<T>,
}

impl<T> Default for DependencyChanges<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            remove: Vec::new(),
        }
    }
}

impl<T> DependencyChanges<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Optional changes to apply to an item.
///
/// Every field is independent. `None` leaves the field unchanged on the
/// platform, as do the sentinel values the validators recognise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Text file holding the new description.
    pub description: Option<PathBuf>,
    /// Preview image file.
    pub preview: Option<PathBuf>,
    /// Directory holding the item content.
    pub content: Option<PathBuf>,
    pub title: Option<String>,
    /// Raw visibility level, 0 to 3.
    pub visibility: Option<i64>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
    /// API language code of the title and description.
    pub language: Option<String>,
    pub app_dependencies: DependencyChanges<AppId>,
    pub item_dependencies: DependencyChanges<ItemId>,
    /// Text file holding the change note submitted with the update.
    pub patch_note: Option<PathBuf>,
}

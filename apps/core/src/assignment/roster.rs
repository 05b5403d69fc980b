use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::balancer::select_handler;
use crate::error::{DeskError, Result};
use crate::models::{Category, Priority};

/// A person or queue that can be assigned tickets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Handler {
    pub id: String,
    pub categories: BTreeSet<Category>,
    pub max_load: u32,
    #[serde(default)]
    pub current_load: u32,
}

impl Handler {
    pub fn new(
        id: impl Into<String>,
        categories: impl IntoIterator<Item = Category>,
        max_load: u32,
        current_load: u32,
    ) -> Self {
        Self {
            id: id.into(),
            categories: categories.into_iter().collect(),
            max_load,
            current_load,
        }
    }

    pub fn handles(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_load < self.max_load
    }
}

/// Shared, mutable view of the handler roster.
///
/// Selection and the load increment happen under one lock, so two concurrent
/// reservations never both claim a handler's last free slot.
pub struct HandlerRoster {
    handlers: Mutex<Vec<Handler>>,
}

impl HandlerRoster {
    pub fn new(handlers: Vec<Handler>) -> Self {
        Self {
            handlers: Mutex::new(handlers),
        }
    }

    /// Chooses a handler for a `category` ticket and charges them one unit of load.
    pub fn reserve(&self, category: Category, priority: Priority) -> Result<String> {
        let mut handlers = self.lock();
        Self::reserve_locked(&mut handlers, category, priority)
    }

    /// Moves a ticket off `previous` (if any) and onto a freshly selected handler, under
    /// one lock. On failure `previous` keeps its slot and nothing changes.
    pub fn transfer(
        &self,
        previous: Option<&str>,
        category: Category,
        priority: Priority,
    ) -> Result<String> {
        let mut handlers = self.lock();
        let released = previous.and_then(|id| {
            let handler = handlers.iter_mut().find(|h| h.id == id && h.current_load > 0)?;
            handler.current_load -= 1;
            Some(handler.id.clone())
        });

        let result = Self::reserve_locked(&mut handlers, category, priority);
        if result.is_err() {
            if let Some(handler) = released
                .as_deref()
                .and_then(|id| handlers.iter_mut().find(|h| h.id == id))
            {
                handler.current_load += 1;
            }
        }
        result
    }

    fn reserve_locked(
        handlers: &mut [Handler],
        category: Category,
        priority: Priority,
    ) -> Result<String> {
        let id = select_handler(handlers, category)
            .map(|h| h.id.clone())
            .ok_or_else(|| DeskError::NoEligibleHandler {
                category: category.to_string(),
            })?;

        if let Some(handler) = handlers.iter_mut().find(|h| h.id == id) {
            if !handler.has_capacity() || !handler.handles(category) {
                warn!(
                    "No skilled handler free for {}, overflowing to {}",
                    category, handler.id
                );
            }
            handler.current_load += 1;
            info!(
                "Assigned {} {} ticket to {} ({}/{})",
                priority, category, handler.id, handler.current_load, handler.max_load
            );
        }
        Ok(id)
    }

    /// Returns one unit of load to `handler_id`. Unknown ids are ignored.
    pub fn release(&self, handler_id: &str) {
        let mut handlers = self.lock();
        match handlers.iter_mut().find(|h| h.id == handler_id) {
            Some(handler) => {
                handler.current_load = handler.current_load.saturating_sub(1);
                debug!("Released {} ({}/{})", handler.id, handler.current_load, handler.max_load);
            }
            None => warn!("Release for unknown handler {}", handler_id),
        }
    }

    pub fn snapshot(&self) -> Vec<Handler> {
        self.lock().clone()
    }

    pub fn load_of(&self, handler_id: &str) -> Option<u32> {
        self.lock()
            .iter()
            .find(|h| h.id == handler_id)
            .map(|h| h.current_load)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Handler>> {
        self.handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

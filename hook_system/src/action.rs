//! Pre and post actions
//!
//! Actions are plain callbacks keyed by [`ActionType`]. A pre action sees the
//! request before any item is processed, a post action sees each entity after
//! it was written.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The kind of change a request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Save,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "create",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::Save => "save",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type PreAction<R> = Arc<dyn Fn(&R) -> anyhow::Result<()> + Send + Sync>;

pub type PostAction<E> = Arc<dyn Fn(&mut E) -> anyhow::Result<()> + Send + Sync>;

/// Adapt a pre action written for an ancestor request type
pub fn upcast_pre_action<D, B>(action: PreAction<B>, upcast: fn(&D) -> &B) -> PreAction<D>
where
    D: ?Sized + 'static,
    B: ?Sized + 'static,
{
    Arc::new(move |request: &D| action(upcast(request)))
}

/// Adapt a post action written for an ancestor entity type
pub fn upcast_post_action<D, B>(
    action: PostAction<B>,
    upcast: fn(&mut D) -> &mut B,
) -> PostAction<D>
where
    D: ?Sized + 'static,
    B: ?Sized + 'static,
{
    Arc::new(move |entity: &mut D| action(upcast(entity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Versioned: Send + Sync {
        fn bump(&mut self);
    }

    struct Row {
        version: u32,
    }

    impl Versioned for Row {
        fn bump(&mut self) {
            self.version += 1;
        }
    }

    #[test]
    fn test_upcast_post_action() {
        let bump: PostAction<dyn Versioned> = Arc::new(|entity: &mut (dyn Versioned + 'static)| {
            entity.bump();
            Ok(())
        });
        let action = upcast_post_action::<Row, dyn Versioned>(bump, |row| row);

        let mut row = Row { version: 1 };
        action(&mut row).unwrap();
        action(&mut row).unwrap();
        assert_eq!(row.version, 3);
    }

    #[test]
    fn test_action_type_serialization() {
        assert_eq!(serde_json::to_string(&ActionType::Save).unwrap(), "\"save\"");
        assert_eq!(ActionType::Delete.to_string(), "delete");
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named tier in the task hierarchy (e.g. epic, story, task).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Level {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Grouping metadata stored alongside tasks in the collection document.
///
/// `levels` is ordered from broadest to narrowest. `parents` maps a task id
/// to the id of its parent task. Both are format-checked only; resolving
/// parent ids against stored tasks is left to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hierarchy {
    pub levels: Vec<Level>,
    pub parents: BTreeMap<String, String>,
}

impl Hierarchy {
    /// Parent id assigned to `task_id`, if any.
    #[must_use]
    pub fn parent_of(&self, task_id: &str) -> Option<&str> {
        self.parents.get(task_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{Hierarchy, Level};

    #[test]
    fn json_shape_is_stable() {
        let mut hierarchy = Hierarchy {
            levels: vec![Level::new("epic"), Level::new("task")],
            parents: std::collections::BTreeMap::new(),
        };
        hierarchy
            .parents
            .insert("task-2".to_string(), "task-1".to_string());

        let json = serde_json::to_value(&hierarchy).unwrap();
        assert_eq!(json["levels"][0]["name"], "epic");
        assert_eq!(json["parents"]["task-2"], "task-1");
    }

    #[test]
    fn parent_lookup() {
        let mut hierarchy = Hierarchy::default();
        hierarchy
            .parents
            .insert("task-2".to_string(), "task-1".to_string());
        assert_eq!(hierarchy.parent_of("task-2"), Some("task-1"));
        assert_eq!(hierarchy.parent_of("task-1"), None);
    }

    #[test]
    fn empty_document_deserializes() {
        let hierarchy: Hierarchy = serde_json::from_str("{}").unwrap();
        assert!(hierarchy.levels.is_empty());
        assert!(hierarchy.parents.is_empty());
    }
}

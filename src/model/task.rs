use serde::{Deserialize, Deserializer, Serialize};

/// View selector over the task collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Parse a filter name as used on the command line
    pub fn parse(s: &str) -> Option<Filter> {
        match s {
            "all" => Some(Filter::All),
            "active" => Some(Filter::Active),
            "completed" => Some(Filter::Completed),
            _ => None,
        }
    }

    /// Whether a task passes this filter
    pub fn passes(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier, assigned at creation and never changed
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl Task {
    /// Create a new, not-yet-completed task
    pub fn new(id: String, title: String, description: String) -> Self {
        Task {
            id,
            title,
            description,
            completed: false,
        }
    }
}

/// Accept either a string or a bare number for `id`.
///
/// Early slot files stored millisecond-timestamp ids as JSON numbers;
/// those are coerced to their decimal string form on load.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

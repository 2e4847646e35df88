//! The "classes" collection: entity types, validation and query keys.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::cache::{CollectionKey, Entity};
use crate::config::Config;
use crate::coordinator::Validate;
use crate::error::MutationError;
use crate::filter::Searchable;
use crate::remote::HttpTable;

/// Display gradients assigned to classes, round-robin at creation time.
pub const CLASS_COLORS: [&str; 6] = [
  "from-blue-500 to-indigo-600",
  "from-green-500 to-teal-600",
  "from-yellow-500 to-orange-600",
  "from-pink-500 to-rose-600",
  "from-purple-500 to-violet-600",
  "from-cyan-500 to-sky-600",
];

/// Color for the n-th class a teacher creates.
pub fn next_color(existing: usize) -> &'static str {
  CLASS_COLORS[existing % CLASS_COLORS.len()]
}

/// The fixed set of class letters a class may be named after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassName {
  A,
  B,
  C,
  D,
  E,
  F,
  G,
  H,
}

impl ClassName {
  /// All letters, in form/display order.
  pub const ALL: [ClassName; 8] = [
    ClassName::A,
    ClassName::B,
    ClassName::C,
    ClassName::D,
    ClassName::E,
    ClassName::F,
    ClassName::G,
    ClassName::H,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ClassName::A => "A",
      ClassName::B => "B",
      ClassName::C => "C",
      ClassName::D => "D",
      ClassName::E => "E",
      ClassName::F => "F",
      ClassName::G => "G",
      ClassName::H => "H",
    }
  }
}

impl fmt::Display for ClassName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One class as stored remotely.
///
/// `id`, `student_count` and `created_at` are owned by the store; clients
/// never write them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
  pub id: String,
  pub name: ClassName,
  pub subject: String,
  pub student_count: u32,
  pub color: String,
  pub created_at: DateTime<Utc>,
}

impl Class {
  /// Formatted name shown in the dashboard, e.g. "Class A".
  pub fn display_name(&self) -> String {
    format!("Class {}", self.name)
  }
}

impl Entity for Class {
  fn entity_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "class"
  }

  fn entity_label() -> &'static str {
    "Class"
  }
}

impl Searchable for Class {
  fn matches(&self, needle: &str) -> bool {
    self.subject.to_lowercase().contains(needle)
      || self.display_name().to_lowercase().contains(needle)
  }
}

/// Creation payload for a class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDraft {
  pub name: ClassName,
  pub subject: String,
  pub student_count: u32,
  pub color: String,
}

impl ClassDraft {
  /// A new class starts with no students; the color comes from the palette.
  pub fn new(name: ClassName, subject: impl Into<String>, color: impl Into<String>) -> Self {
    Self {
      name,
      subject: subject.into(),
      student_count: 0,
      color: color.into(),
    }
  }
}

fn validate_subject(subject: &str) -> Result<(), MutationError> {
  if subject.trim().chars().count() < 3 {
    return Err(MutationError::validation(
      "subject",
      "Subject must be at least 3 characters.",
    ));
  }
  Ok(())
}

impl Validate for ClassDraft {
  fn validate(&self) -> Result<(), MutationError> {
    validate_subject(&self.subject)
  }
}

/// Editable fields of a class. Identity and derived fields (id, student
/// count, color) are never client-writable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<ClassName>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subject: Option<String>,
}

impl Validate for ClassPatch {
  fn validate(&self) -> Result<(), MutationError> {
    if self.name.is_none() && self.subject.is_none() {
      return Err(MutationError::validation(
        "patch",
        "No editable fields in update.",
      ));
    }
    if let Some(subject) = &self.subject {
      validate_subject(subject)?;
    }
    Ok(())
  }
}

/// Query keys for class collections.
#[derive(Clone, Debug)]
pub enum ClassQuery {
  /// Every class the teacher owns, newest first
  All,
}

impl CollectionKey for ClassQuery {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::All => "classes:all",
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::All => "all classes".to_string(),
    }
  }
}

/// The classes table of the configured backend.
pub type ClassesTable = HttpTable<Class, ClassDraft, ClassPatch>;

/// Open the remote classes table, ordered newest first.
pub fn classes_table(config: &Config) -> Result<ClassesTable> {
  Ok(HttpTable::new(config, &config.backend.classes_table)?.with_order("created_at.desc"))
}

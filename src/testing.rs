//! Test fixtures: a scriptable in-process stand-in for the remote table.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::classes::{next_color, Class, ClassDraft, ClassName, ClassPatch};
use crate::remote::{RemoteError, RemoteTable};

/// Route tracing output through the test harness; safe to call repeatedly.
pub(crate) fn init_tracing() {
  use tracing_subscriber::EnvFilter;
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// A class row as the store would return it.
pub(crate) fn class(id: &str, name: ClassName, subject: &str) -> Class {
  Class {
    id: id.to_string(),
    name,
    subject: subject.to_string(),
    student_count: 0,
    color: next_color(0).to_string(),
    created_at: Utc::now(),
  }
}

/// Scripted outcome for one `list` call.
pub(crate) enum ListScript {
  /// Delay in milliseconds, then these rows
  Rows(u64, Vec<Class>),
  /// Fail with this store message
  Fail(String),
}

/// In-process classes table with controllable latency and failures.
///
/// Unscripted `list` calls return a snapshot of the backing rows; inserts
/// generate sequential ids and prepend, mimicking a newest-first ordering.
pub(crate) struct FakeTable {
  rows: Mutex<Vec<Class>>,
  list_script: Mutex<VecDeque<ListScript>>,
  insert_delay_ms: AtomicU64,
  update_delay_ms: AtomicU64,
  insert_failure: Mutex<Option<String>>,
  next_id: AtomicU64,
  calls: AtomicUsize,
  list_calls: AtomicUsize,
}

impl FakeTable {
  pub(crate) fn new() -> Self {
    Self {
      rows: Mutex::new(Vec::new()),
      list_script: Mutex::new(VecDeque::new()),
      insert_delay_ms: AtomicU64::new(0),
      update_delay_ms: AtomicU64::new(0),
      insert_failure: Mutex::new(None),
      next_id: AtomicU64::new(1),
      calls: AtomicUsize::new(0),
      list_calls: AtomicUsize::new(0),
    }
  }

  /// Replace the backing rows.
  pub(crate) fn seed(&self, rows: Vec<Class>) {
    *self.rows.lock().unwrap() = rows;
  }

  /// Queue a scripted outcome for the next unconsumed `list` call.
  pub(crate) fn script_list(&self, script: ListScript) {
    self.list_script.lock().unwrap().push_back(script);
  }

  /// Make the next insert fail with the given store message.
  pub(crate) fn fail_insert(&self, message: &str) {
    *self.insert_failure.lock().unwrap() = Some(message.to_string());
  }

  pub(crate) fn set_insert_delay(&self, ms: u64) {
    self.insert_delay_ms.store(ms, Ordering::SeqCst);
  }

  pub(crate) fn set_update_delay(&self, ms: u64) {
    self.update_delay_ms.store(ms, Ordering::SeqCst);
  }

  /// Total network calls issued (all four operations).
  pub(crate) fn network_calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub(crate) fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RemoteTable for FakeTable {
  type Item = Class;
  type Draft = ClassDraft;
  type Patch = ClassPatch;

  async fn list(&self) -> Result<Vec<Class>, RemoteError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.list_calls.fetch_add(1, Ordering::SeqCst);

    let script = self.list_script.lock().unwrap().pop_front();
    match script {
      Some(ListScript::Rows(delay_ms, rows)) => {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(rows)
      }
      Some(ListScript::Fail(message)) => Err(RemoteError::Store(message)),
      None => Ok(self.rows.lock().unwrap().clone()),
    }
  }

  async fn insert(&self, draft: &ClassDraft) -> Result<Class, RemoteError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.insert_failure.lock().unwrap().take() {
      return Err(RemoteError::Store(message));
    }

    let delay = self.insert_delay_ms.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(delay)).await;

    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
    let row = Class {
      id: id.to_string(),
      name: draft.name,
      subject: draft.subject.clone(),
      student_count: draft.student_count,
      color: draft.color.clone(),
      created_at: Utc::now(),
    };
    self.rows.lock().unwrap().insert(0, row.clone());
    Ok(row)
  }

  async fn update(&self, key: &str, patch: &ClassPatch) -> Result<Class, RemoteError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let delay = self.update_delay_ms.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(delay)).await;

    let mut rows = self.rows.lock().unwrap();
    let Some(row) = rows.iter_mut().find(|r| r.id == key) else {
      return Err(RemoteError::NotFound(key.to_string()));
    };
    if let Some(name) = patch.name {
      row.name = name;
    }
    if let Some(subject) = &patch.subject {
      row.subject = subject.clone();
    }
    Ok(row.clone())
  }

  async fn delete(&self, key: &str) -> Result<(), RemoteError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let mut rows = self.rows.lock().unwrap();
    let Some(index) = rows.iter().position(|r| r.id == key) else {
      return Err(RemoteError::NotFound(key.to_string()));
    };
    rows.remove(index);
    Ok(())
  }
}

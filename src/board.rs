use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::events::{Event, EventPatch, NewEvent};
use crate::projects::{NewProject, Project, ProjectPatch};
use crate::space::SpaceLabel;

const TASKS_FILE: &str = "quick_tasks.json";
const LINKS_FILE: &str = "quick_access.json";
const EVENTS_FILE: &str = "events.json";
const PROJECTS_FILE: &str = "projects.json";

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Board storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Board data is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No item with id {0}")]
    NotFound(Uuid),

    #[error("{0}")]
    Invalid(String),
}

/// A short to-do shown on the dashboard or a personal space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickTask {
    pub id: Uuid,
    pub user_space: SpaceLabel,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_date: DateTime<Utc>,
}

/// A bookmarked link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickLink {
    pub id: Uuid,
    pub user_space: SpaceLabel,
    pub title: String,
    pub url: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Task creation form data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuickTask {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Partial task update; an empty `due_date` clears it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickTaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Link creation form data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuickLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Whether a row scoped to `row` shows up in the space `viewer`
///
/// The shared space only sees shared rows; a personal space sees its own
/// rows and the shared ones.
pub fn visible_in(viewer: SpaceLabel, row: SpaceLabel) -> bool {
    row == SpaceLabel::Both || (viewer != SpaceLabel::Both && row == viewer)
}

/// Prefix `https://` onto links typed without a scheme
pub fn normalize_url(url: &str) -> Result<String, BoardError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(BoardError::Invalid("URL is required".to_string()));
    }
    if url.starts_with("http") {
        Ok(url.to_string())
    } else {
        Ok(format!("https://{url}"))
    }
}

/// Trimmed `value`, or an `Invalid` error naming the missing field
pub(crate) fn required(value: &str, field: &str) -> Result<String, BoardError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BoardError::Invalid(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn parse_due_date(raw: &str) -> Result<Option<NaiveDate>, BoardError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BoardError::Invalid(format!("Invalid due date: {raw}")))
}

/// A record kept in one of the board's JSON files
pub(crate) trait Row: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> Uuid;
    fn user_space(&self) -> SpaceLabel;
    fn created(&self) -> DateTime<Utc>;
}

impl Row for QuickTask {
    fn id(&self) -> Uuid {
        self.id
    }

    fn user_space(&self) -> SpaceLabel {
        self.user_space
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_date
    }
}

impl Row for QuickLink {
    fn id(&self) -> Uuid {
        self.id
    }

    fn user_space(&self) -> SpaceLabel {
        self.user_space
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One JSON file of rows, mirrored in memory
///
/// Changes are staged on a copy and only replace `rows` once the file write
/// has succeeded, so memory never runs ahead of disk.
#[derive(Debug)]
struct Table<T> {
    path: PathBuf,
    rows: Vec<T>,
}

impl<T: Row> Table<T> {
    fn open(path: PathBuf) -> Result<Self, BoardError> {
        let rows = load_rows(&path)?;
        Ok(Table { path, rows })
    }

    fn visible(&self, viewer: SpaceLabel) -> Vec<T> {
        let mut rows: Vec<T> = self
            .rows
            .iter()
            .filter(|row| visible_in(viewer, row.user_space()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created().cmp(&a.created()));
        rows
    }

    fn position(&self, viewer: SpaceLabel, id: Uuid) -> Result<usize, BoardError> {
        self.rows
            .iter()
            .position(|row| row.id() == id && visible_in(viewer, row.user_space()))
            .ok_or(BoardError::NotFound(id))
    }

    fn get(&self, viewer: SpaceLabel, id: Uuid) -> Result<T, BoardError> {
        let index = self.position(viewer, id)?;
        Ok(self.rows[index].clone())
    }

    fn insert(&mut self, row: T) -> Result<(), BoardError> {
        let mut staged = self.rows.clone();
        staged.insert(0, row);
        self.commit(staged)
    }

    fn update(
        &mut self,
        viewer: SpaceLabel,
        id: Uuid,
        change: impl FnOnce(&mut T) -> Result<(), BoardError>,
    ) -> Result<T, BoardError> {
        let index = self.position(viewer, id)?;
        let mut staged = self.rows.clone();
        change(&mut staged[index])?;
        let updated = staged[index].clone();
        self.commit(staged)?;
        Ok(updated)
    }

    fn remove(&mut self, viewer: SpaceLabel, id: Uuid) -> Result<(), BoardError> {
        let index = self.position(viewer, id)?;
        let mut staged = self.rows.clone();
        staged.remove(index);
        self.commit(staged)
    }

    fn commit(&mut self, staged: Vec<T>) -> Result<(), BoardError> {
        save_rows(&self.path, &staged)?;
        self.rows = staged;
        Ok(())
    }
}

/// Everything the two spaces share a board for: quick tasks, quick-access
/// links, events and projects, persisted as JSON under a data directory
///
/// Rows are held in memory and written through on every change. A failed
/// write leaves both the file and the in-memory rows as they were.
#[derive(Debug)]
pub struct Board {
    tasks: Table<QuickTask>,
    links: Table<QuickLink>,
    events: Table<Event>,
    projects: Table<Project>,
}

impl Board {
    /// Open (or initialise) a board in `dir`
    ///
    /// Creates the directory and any missing data file as an empty list.
    ///
    /// # Arguments
    /// * `dir` - Data directory
    ///
    /// # Returns
    /// * `Result<Board, BoardError>` - The loaded board or an IO/parse error
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, BoardError> {
        let dir = dir.as_ref();
        create_dir_all(dir)?;

        Ok(Board {
            tasks: Table::open(dir.join(TASKS_FILE))?,
            links: Table::open(dir.join(LINKS_FILE))?,
            events: Table::open(dir.join(EVENTS_FILE))?,
            projects: Table::open(dir.join(PROJECTS_FILE))?,
        })
    }

    pub fn tasks(&self, viewer: SpaceLabel) -> Vec<QuickTask> {
        self.tasks.visible(viewer)
    }

    pub fn create_task(
        &mut self,
        space: SpaceLabel,
        new: NewQuickTask,
    ) -> Result<QuickTask, BoardError> {
        let task = QuickTask {
            id: Uuid::new_v4(),
            user_space: space,
            title: required(&new.title, "Title")?,
            completed: false,
            due_date: parse_due_date(new.due_date.as_deref().unwrap_or_default())?,
            created_date: Utc::now(),
        };

        self.tasks.insert(task.clone())?;
        info!("Created quick task {} in {}", task.id, space);
        Ok(task)
    }

    /// Apply a patch to a task visible in `viewer`
    pub fn update_task(
        &mut self,
        viewer: SpaceLabel,
        id: Uuid,
        patch: QuickTaskPatch,
    ) -> Result<QuickTask, BoardError> {
        let title = patch
            .title
            .as_deref()
            .map(|title| required(title, "Title"))
            .transpose()?;
        let due_date = patch.due_date.as_deref().map(parse_due_date).transpose()?;

        self.tasks.update(viewer, id, |task| {
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(completed) = patch.completed {
                task.completed = completed;
            }
            if let Some(due_date) = due_date {
                task.due_date = due_date;
            }
            Ok(())
        })
    }

    pub fn delete_task(&mut self, viewer: SpaceLabel, id: Uuid) -> Result<(), BoardError> {
        self.tasks.remove(viewer, id)?;
        info!("Deleted quick task {id}");
        Ok(())
    }

    pub fn links(&self, viewer: SpaceLabel) -> Vec<QuickLink> {
        self.links.visible(viewer)
    }

    pub fn create_link(
        &mut self,
        space: SpaceLabel,
        new: NewQuickLink,
    ) -> Result<QuickLink, BoardError> {
        let category = new
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && c != "none");

        let link = QuickLink {
            id: Uuid::new_v4(),
            user_space: space,
            title: required(&new.title, "Title")?,
            url: normalize_url(&new.url)?,
            category,
            created_at: Utc::now(),
        };

        self.links.insert(link.clone())?;
        info!("Created quick link {} in {}", link.id, space);
        Ok(link)
    }

    pub fn delete_link(&mut self, viewer: SpaceLabel, id: Uuid) -> Result<(), BoardError> {
        self.links.remove(viewer, id)?;
        info!("Deleted quick link {id}");
        Ok(())
    }

    /// Events visible in `viewer`, newest first
    pub fn events(&self, viewer: SpaceLabel) -> Vec<Event> {
        self.events.visible(viewer)
    }

    pub fn event(&self, viewer: SpaceLabel, id: Uuid) -> Result<Event, BoardError> {
        self.events.get(viewer, id)
    }

    /// Create an event in `space`, with its status derived from the dates
    pub fn create_event(&mut self, space: SpaceLabel, new: NewEvent) -> Result<Event, BoardError> {
        let event = Event::create(space, new, Utc::now())?;
        self.events.insert(event.clone())?;
        info!("Created {} {} in {}", event.kind, event.id, space);
        Ok(event)
    }

    pub fn update_event(
        &mut self,
        viewer: SpaceLabel,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Event, BoardError> {
        self.events
            .update(viewer, id, |event| event.apply(patch, Utc::now()))
    }

    pub fn delete_event(&mut self, viewer: SpaceLabel, id: Uuid) -> Result<(), BoardError> {
        self.events.remove(viewer, id)?;
        info!("Deleted event {id}");
        Ok(())
    }

    /// Projects visible in `viewer`, newest first
    pub fn projects(&self, viewer: SpaceLabel) -> Vec<Project> {
        self.projects.visible(viewer)
    }

    pub fn project(&self, viewer: SpaceLabel, id: Uuid) -> Result<Project, BoardError> {
        self.projects.get(viewer, id)
    }

    pub fn create_project(
        &mut self,
        space: SpaceLabel,
        new: NewProject,
    ) -> Result<Project, BoardError> {
        let project = Project::create(space, new, Utc::now())?;
        self.projects.insert(project.clone())?;
        info!("Created project {} in {}", project.id, space);
        Ok(project)
    }

    pub fn update_project(
        &mut self,
        viewer: SpaceLabel,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, BoardError> {
        self.projects.update(viewer, id, |project| project.apply(patch))
    }

    pub fn delete_project(&mut self, viewer: SpaceLabel, id: Uuid) -> Result<(), BoardError> {
        self.projects.remove(viewer, id)?;
        info!("Deleted project {id}");
        Ok(())
    }
}

fn load_rows<T: Serialize + DeserializeOwned>(path: &Path) -> Result<Vec<T>, BoardError> {
    if !path.exists() {
        save_rows::<T>(path, &[])?;
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Replace `path` with `rows` in one step
///
/// The JSON goes to a sibling `.tmp` file first and is renamed over the old
/// file, so a crash mid-write never leaves a truncated list behind.
fn save_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BoardError> {
    let json = serde_json::to_string_pretty(rows)?;
    let staging = staging_path(path);

    fs::write(&staging, json)?;
    if let Err(e) = fs::rename(&staging, path) {
        fs::remove_file(&staging).ok();
        return Err(e.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

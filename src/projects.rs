use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{BoardError, Row, normalize_url, required};
use crate::space::SpaceLabel;

/// Colours offered when creating a project; the first is the default
pub const PROJECT_COLORS: [&str; 8] = [
    "#8B5CF6", "#D946EF", "#F97316", "#0EA5E9", "#10B981", "#EC4899", "#6366F1", "#F59E0B",
];

/// Something being built, with a manually tracked completion percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_space: SpaceLabel,
    pub name: String,
    pub description: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub tech_stack: Vec<String>,
    pub color: String,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial project update; empty URLs clear them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
}

/// `#RRGGBB`, or the default colour when blank
fn parse_color(raw: Option<&str>) -> Result<String, BoardError> {
    let color = raw.map(str::trim).unwrap_or_default();
    if color.is_empty() {
        return Ok(PROJECT_COLORS[0].to_string());
    }

    let hex = color.strip_prefix('#').unwrap_or_default();
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BoardError::Invalid(format!("Invalid colour: {color}")));
    }
    Ok(color.to_ascii_uppercase())
}

fn parse_progress(value: i64) -> Result<u8, BoardError> {
    u8::try_from(value)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| BoardError::Invalid("Progress must be between 0 and 100".to_string()))
}

fn optional_url(raw: Option<&str>) -> Result<Option<String>, BoardError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) => normalize_url(url).map(Some),
    }
}

fn clean_stack(stack: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(stack.len());
    for tech in stack {
        let tech = tech.trim();
        if !tech.is_empty() && !cleaned.iter().any(|t| t == tech) {
            cleaned.push(tech.to_string());
        }
    }
    cleaned
}

impl Project {
    pub(crate) fn create(
        space: SpaceLabel,
        new: NewProject,
        now: DateTime<Utc>,
    ) -> Result<Self, BoardError> {
        Ok(Project {
            id: Uuid::new_v4(),
            user_space: space,
            name: required(&new.name, "Name")?,
            description: new.description.unwrap_or_default().trim().to_string(),
            github_url: optional_url(new.github_url.as_deref())?,
            demo_url: optional_url(new.demo_url.as_deref())?,
            tech_stack: clean_stack(new.tech_stack),
            color: parse_color(new.color.as_deref())?,
            progress: 0,
            created_at: now,
        })
    }

    /// Merge `patch` in, validating every field before touching any
    pub(crate) fn apply(&mut self, patch: ProjectPatch) -> Result<(), BoardError> {
        let name = patch.name.as_deref().map(|v| required(v, "Name")).transpose()?;
        let github_url = patch
            .github_url
            .as_deref()
            .map(|v| optional_url(Some(v)))
            .transpose()?;
        let demo_url = patch
            .demo_url
            .as_deref()
            .map(|v| optional_url(Some(v)))
            .transpose()?;
        let color = patch
            .color
            .as_deref()
            .map(|v| parse_color(Some(v)))
            .transpose()?;
        let progress = patch.progress.map(parse_progress).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(github_url) = github_url {
            self.github_url = github_url;
        }
        if let Some(demo_url) = demo_url {
            self.demo_url = demo_url;
        }
        if let Some(stack) = patch.tech_stack {
            self.tech_stack = clean_stack(stack);
        }
        if let Some(color) = color {
            self.color = color;
        }
        if let Some(progress) = progress {
            self.progress = progress;
        }
        Ok(())
    }
}

impl Row for Project {
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

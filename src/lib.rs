/*!
# HackBuddy

A personal productivity board for two hackathon teammates, Macha and
Veerendra, built in Rust.

## Overview

Each user has a personal space (`/macha`, `/veerendra`) next to a shared
dashboard. Personal spaces sit behind a static security code: it is a speed
bump against wandering into the wrong board, not access control.

## Architecture

### Space context
- **Space Resolver** - Maps the navigation path (plus the remembered identity)
  to the active user and display label
- **Verification Gate** - Checks security codes and keeps the per-user
  verified flag in a browser-scoped key-value store
- **Key-value store** - In-memory for embedding and tests, cookie-backed in the
  web server

### Board
- Quick tasks, quick-access links, events (hackathons, competitions, quizzes,
  workshops) and projects, scoped per space and stored as JSON
  (`quick_tasks.json`, `quick_access.json`, `events.json`, `projects.json`)
- Every change is written to a sibling temp file and renamed into place
  before the in-memory rows are replaced

### Web layer (`web` feature)
- axum router with the space pages, the security-code form and a JSON API

## Modules

- **space**: Identity, space labels and the path resolver
- **storage**: Key-value store trait and implementations
- **context**: `SpaceContext`, the verification state machine
- **theme**: Light/dark preference and theme-aware space colours
- **board**: The persisted board, quick tasks and quick-access links
- **events**: Event records, status derivation and progress
- **projects**: Project records, colours and progress
- **config**: Environment configuration
- **error**: HTTP error mapping
- **app**: Routing and handlers

## REST API Endpoints

- `GET /api/space?path=` - Resolved space, colour, theme and verified flag
- `POST /api/verify`, `POST /api/clear` - Security code check and sign-out
- `POST /api/theme/toggle` - Flip the stored theme
- `/api/tasks`, `/api/tasks/{id}` - Quick task CRUD for the current space
- `/api/links`, `/api/links/{id}` - Quick-access links for the current space
- `/api/events`, `/api/events/{id}` - Event CRUD, listed with live progress
- `/api/projects`, `/api/projects/{id}` - Project CRUD
*/

pub mod board;
pub mod config;
pub mod context;
pub mod events;
pub mod projects;
pub mod space;
pub mod storage;
pub mod theme;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod error;

pub use board::*;
pub use context::*;
pub use events::*;
pub use projects::*;
pub use space::*;
pub use storage::*;
pub use theme::*;

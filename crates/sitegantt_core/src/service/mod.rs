//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and pure engine steps into Gantt views.
//! - Keep the CLI decoupled from storage details.

pub mod gantt_service;
pub mod kanban;

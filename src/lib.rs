//! # cadre-rs
//!
//! Routes kanban task notifications to capability-matched artificial
//! employees and drives each task through a multi-step workflow.
//!
//! Provides the employee aggregate and registry, the capability rule
//! engine, the workflow state machine, queue consumption (pgmq), task
//! board integration, memory recall, and OpenTelemetry observability.

pub mod capability;
pub mod config;
pub mod consumer;
pub mod db;
pub mod employee;
pub mod error;
pub mod events;
pub mod llm;
pub mod memory;
pub mod model;
pub mod resolver;
pub mod telemetry;
pub mod tracker;
pub mod workflow;

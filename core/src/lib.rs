//! Client core for the productivity backend: todos, habits and chat.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of the stateless
//! request/response layer, [`SyncClient`] keeps a local mirror of one remote
//! collection that only ever reflects what the server has confirmed.
//!
//! # Design
//! - `ResourceClient<R>` is stateless and generic over [`Resource`]; todos and
//!   habits share list/create/delete, with toggle and check-in added per kind.
//! - `SyncClient<R>` is two-phase (`begin_*` then `complete`) so the host can
//!   run requests however it likes; the [`Transport`] trait covers the common
//!   blocking case.
//! - Derived figures live in [`views`] and are recomputed on every call.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resource;
pub mod sync;
pub mod types;
pub mod views;

pub use chat::{ChatClient, ChatLog};
pub use client::{HabitClient, ResourceClient, TodoClient};
pub use config::{Config, ConfigError};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use resource::Resource;
pub use sync::{HabitSync, Operation, Pending, SyncClient, SyncOutcome, TodoSync};
pub use types::{Frequency, Habit, NewHabit, NewTodo, Priority, Todo};

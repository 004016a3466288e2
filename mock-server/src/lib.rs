use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub frequency: Frequency,
    pub streak: u32,
    pub last_check_in: Option<DateTime<Utc>>,
    pub completions: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateHabit {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
}

#[derive(Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `{success, data, error}` wrapper used by every resource route.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Insertion-ordered collections; list responses preserve creation order.
#[derive(Default)]
pub struct Store {
    pub todos: Vec<Todo>,
    pub habits: Vec<Habit>,
}

pub type Db = Arc<RwLock<Store>>;

/// Source of "now" for check-in bookkeeping.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
struct AppState {
    db: Db,
    clock: Clock,
}

pub fn app() -> Router {
    app_with_clock(Arc::new(Utc::now))
}

pub fn app_with_clock(clock: Clock) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        clock,
    };
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", delete(delete_todo))
        .route("/todos/{id}/toggle", patch(toggle_todo))
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/{id}", delete(delete_habit))
        .route("/habits/{id}/checkin", post(check_in))
        .route("/chat", post(chat))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = Envelope {
        success: true,
        data: Some(data),
        error: None,
    };
    (status, Json(body)).into_response()
}

fn fail(status: StatusCode, error: impl Into<String>) -> Response {
    let body: Envelope<()> = Envelope {
        success: false,
        data: None,
        error: Some(error.into()),
    };
    (status, Json(body)).into_response()
}

fn acknowledged() -> Response {
    let body: Envelope<()> = Envelope {
        success: true,
        data: None,
        error: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

// --- todos ---

async fn list_todos(State(state): State<AppState>) -> Response {
    let store = state.db.read().await;
    ok(StatusCode::OK, &store.todos)
}

async fn create_todo(
    State(state): State<AppState>,
    input: Result<Json<CreateTodo>, JsonRejection>,
) -> Response {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return fail(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if input.title.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Title is required");
    }
    let todo = Todo {
        id: Uuid::new_v4().to_string(),
        title: input.title.trim().to_string(),
        description: input.description,
        priority: input.priority,
        due_date: input
            .due_date
            .map(|day| day.and_time(chrono::NaiveTime::MIN).and_utc()),
        completed: false,
        created_at: (state.clock)(),
    };
    info!("Created todo {}", todo.id);
    state.db.write().await.todos.push(todo.clone());
    ok(StatusCode::CREATED, todo)
}

async fn toggle_todo(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut store = state.db.write().await;
    match store.todos.iter_mut().find(|t| t.id == id) {
        Some(todo) => {
            todo.completed = !todo.completed;
            debug!("Toggled todo {} to {}", id, todo.completed);
            ok(StatusCode::OK, todo.clone())
        }
        None => fail(StatusCode::NOT_FOUND, "Todo not found"),
    }
}

async fn delete_todo(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut store = state.db.write().await;
    let before = store.todos.len();
    store.todos.retain(|t| t.id != id);
    if store.todos.len() == before {
        return fail(StatusCode::NOT_FOUND, "Todo not found");
    }
    info!("Deleted todo {}", id);
    acknowledged()
}

// --- habits ---

async fn list_habits(State(state): State<AppState>) -> Response {
    let store = state.db.read().await;
    ok(StatusCode::OK, &store.habits)
}

async fn create_habit(
    State(state): State<AppState>,
    input: Result<Json<CreateHabit>, JsonRejection>,
) -> Response {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return fail(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if input.name.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Name is required");
    }
    let habit = Habit {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        description: input.description,
        frequency: input.frequency,
        streak: 0,
        last_check_in: None,
        completions: Vec::new(),
        created_at: (state.clock)(),
    };
    info!("Created habit {}", habit.id);
    state.db.write().await.habits.push(habit.clone());
    ok(StatusCode::CREATED, habit)
}

async fn check_in(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let now = (state.clock)();
    let mut store = state.db.write().await;
    let Some(habit) = store.habits.iter_mut().find(|h| h.id == id) else {
        return fail(StatusCode::NOT_FOUND, "Habit not found");
    };
    match next_streak(habit, now) {
        Ok(streak) => {
            habit.streak = streak;
            habit.last_check_in = Some(now);
            habit.completions.push(now);
            debug!("Checked in habit {}, streak {}", id, streak);
            ok(StatusCode::OK, habit.clone())
        }
        Err(message) => fail(StatusCode::BAD_REQUEST, message),
    }
}

/// Streak after a check-in at `now`, or the rejection message when the habit
/// was already checked in for the current period.
pub fn next_streak(habit: &Habit, now: DateTime<Utc>) -> Result<u32, &'static str> {
    let Some(last) = habit.last_check_in else {
        return Ok(1);
    };
    let (last, today) = (last.date_naive(), now.date_naive());
    match habit.frequency {
        Frequency::Daily => {
            if last == today {
                Err("Already checked in today!")
            } else if last + Duration::days(1) == today {
                Ok(habit.streak + 1)
            } else {
                Ok(1)
            }
        }
        Frequency::Weekly => {
            if last.iso_week() == today.iso_week() {
                Err("Already checked in this week!")
            } else if (last + Duration::weeks(1)).iso_week() == today.iso_week() {
                Ok(habit.streak + 1)
            } else {
                Ok(1)
            }
        }
    }
}

async fn delete_habit(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut store = state.db.write().await;
    let before = store.habits.len();
    store.habits.retain(|h| h.id != id);
    if store.habits.len() == before {
        return fail(StatusCode::NOT_FOUND, "Habit not found");
    }
    info!("Deleted habit {}", id);
    acknowledged()
}

// --- chat ---

async fn chat(
    State(state): State<AppState>,
    input: Result<Json<ChatMessage>, JsonRejection>,
) -> (StatusCode, Json<ChatReply>) {
    let message = match input {
        Ok(Json(input)) => input.message,
        Err(_) => String::new(),
    };
    if message.trim().is_empty() {
        let reply = ChatReply {
            reply: None,
            error: Some("Message is required".to_string()),
        };
        return (StatusCode::BAD_REQUEST, Json(reply));
    }

    let store = state.db.read().await;
    let pending = store.todos.iter().filter(|t| !t.completed).count();
    let reply = match pending {
        0 => format!(
            "You're all caught up. Keep your {} habit(s) going!",
            store.habits.len()
        ),
        n => format!(
            "You have {n} pending todo(s). Start with the highest priority one and check in on your habits after."
        ),
    };
    (
        StatusCode::OK,
        Json(ChatReply {
            reply: Some(reply),
            error: None,
        }),
    )
}

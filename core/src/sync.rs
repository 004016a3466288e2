//! Resource Sync Client: a local mirror of one remote collection.
//!
//! # Design
//! `SyncClient<R>` owns the only copy of the collection and changes it solely
//! in response to its own completed operations. Every operation is two-phase:
//! a `begin_*` call yields a [`Pending`] carrying the `HttpRequest`, and
//! [`SyncClient::complete`] applies the host's response. Nothing is committed
//! before the server answers: created items are the server representation,
//! toggled and checked-in items are replaced wholesale, deletions happen after
//! acknowledgement.
//!
//! Each `Pending` is stamped with the client's generation. [`SyncClient::detach`]
//! bumps it, so responses that arrive for a torn-down view are dropped.
//!
//! Failures never escape as `Err`: `complete` logs them and reports a
//! [`SyncOutcome`]. Only a rejected check-in produces a user-facing notice.

use tracing::{debug, error, warn};

use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::resource::Resource;
use crate::types::{Habit, Todo};

/// Notice shown for a rejected check-in when the server sends no text.
pub const CHECK_IN_REJECTED: &str = "Already checked in today!";

/// What a pending request does to the collection once it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Toggle(String),
    CheckIn(String),
    Remove(String),
}

/// A request issued by a `SyncClient` and awaiting its response.
#[derive(Debug, Clone)]
#[must_use = "a pending operation does nothing until it is completed"]
pub struct Pending {
    operation: Operation,
    generation: u64,
    request: HttpRequest,
}

impl Pending {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// Result of completing an operation, as seen by presentation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The collection now reflects the server's answer.
    Committed,
    /// Nothing changed. The error has been logged and is not user-facing.
    Failed(ApiError),
    /// Nothing changed. The message should be shown to the user.
    Notice(String),
    /// The client was detached after the request was issued; response dropped.
    Stale,
}

impl SyncOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SyncOutcome::Committed)
    }

    /// The user-visible message, if any.
    pub fn notice(&self) -> Option<&str> {
        match self {
            SyncOutcome::Notice(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncClient<R: Resource> {
    api: ResourceClient<R>,
    items: Vec<R>,
    loaded: bool,
    generation: u64,
}

pub type TodoSync = SyncClient<Todo>;
pub type HabitSync = SyncClient<Habit>;

impl<R: Resource> SyncClient<R> {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(ResourceClient::new(base_url))
    }

    pub fn with_client(api: ResourceClient<R>) -> Self {
        Self {
            api,
            items: Vec::new(),
            loaded: false,
            generation: 0,
        }
    }

    /// Current collection in server order, with created items appended.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// True once the first load has finished, whether or not it succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Invalidate every outstanding `Pending`. Their completions become
    /// [`SyncOutcome::Stale`]; operations begun afterwards apply normally.
    pub fn detach(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        debug!("Detached {} sync client, generation {}", R::NAME, self.generation);
    }

    fn pending(&self, operation: Operation, request: HttpRequest) -> Pending {
        Pending {
            operation,
            generation: self.generation,
            request,
        }
    }

    pub fn begin_load(&self) -> Pending {
        self.pending(Operation::Load, self.api.build_list())
    }

    /// Fails with [`ApiError::Validation`] when the required field is blank;
    /// no request exists in that case.
    pub fn begin_create(&self, draft: &R::Draft) -> Result<Pending, ApiError> {
        let request = self.api.build_create(draft)?;
        Ok(self.pending(Operation::Create, request))
    }

    pub fn begin_remove(&self, id: &str) -> Pending {
        self.pending(Operation::Remove(id.to_string()), self.api.build_delete(id))
    }

    /// Apply the host's answer to a pending operation.
    ///
    /// `response` is `Err` when the host could not obtain a response at all.
    pub fn complete(
        &mut self,
        pending: Pending,
        response: Result<HttpResponse, ApiError>,
    ) -> SyncOutcome {
        if pending.generation != self.generation {
            debug!(
                "Dropping stale {} response for {:?}",
                R::NAME,
                pending.operation
            );
            return SyncOutcome::Stale;
        }

        match pending.operation {
            Operation::Load => {
                self.loaded = true;
                match response.and_then(|r| self.api.parse_list(r)) {
                    Ok(items) => {
                        debug!("Loaded {} {}s", items.len(), R::NAME);
                        self.items = items;
                        SyncOutcome::Committed
                    }
                    Err(e) => self.fail("fetching", e),
                }
            }
            Operation::Create => match response.and_then(|r| self.api.parse_item(r)) {
                Ok(item) => {
                    self.insert(item);
                    SyncOutcome::Committed
                }
                Err(e) => self.fail("adding", e),
            },
            Operation::Toggle(id) => match response.and_then(|r| self.api.parse_item(r)) {
                Ok(item) => {
                    self.replace(&id, item);
                    SyncOutcome::Committed
                }
                Err(e) => self.fail("toggling", e),
            },
            Operation::CheckIn(id) => match response.and_then(|r| self.api.parse_item(r)) {
                Ok(item) => {
                    self.replace(&id, item);
                    SyncOutcome::Committed
                }
                Err(ApiError::Application(message)) => {
                    let message = if message.is_empty() {
                        CHECK_IN_REJECTED.to_string()
                    } else {
                        message
                    };
                    warn!("Check-in for {} {} rejected: {}", R::NAME, id, message);
                    SyncOutcome::Notice(message)
                }
                Err(e) => self.fail("checking in", e),
            },
            Operation::Remove(id) => match response.and_then(|r| self.api.parse_delete(r)) {
                Ok(()) => {
                    self.items.retain(|item| item.id() != id);
                    SyncOutcome::Committed
                }
                Err(e) => self.fail("deleting", e),
            },
        }
    }

    /// Execute a pending operation through `transport` and complete it.
    pub fn run<T: Transport>(&mut self, pending: Pending, transport: &T) -> SyncOutcome {
        let response = transport.execute(pending.request());
        self.complete(pending, response)
    }

    pub fn load<T: Transport>(&mut self, transport: &T) -> SyncOutcome {
        let pending = self.begin_load();
        self.run(pending, transport)
    }

    pub fn create<T: Transport>(&mut self, draft: &R::Draft, transport: &T) -> SyncOutcome {
        match self.begin_create(draft) {
            Ok(pending) => self.run(pending, transport),
            Err(e) => {
                warn!("Rejected {} draft: {}", R::NAME, e);
                SyncOutcome::Failed(e)
            }
        }
    }

    pub fn remove<T: Transport>(&mut self, id: &str, transport: &T) -> SyncOutcome {
        let pending = self.begin_remove(id);
        self.run(pending, transport)
    }

    fn insert(&mut self, item: R) {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                warn!("Server returned existing {} id {}; replacing", R::NAME, item.id());
                *existing = item;
            }
            None => self.items.push(item),
        }
    }

    fn replace(&mut self, id: &str, item: R) {
        if let Some(existing) = self.items.iter_mut().find(|existing| existing.id() == id) {
            *existing = item;
        }
    }

    fn fail(&self, action: &str, e: ApiError) -> SyncOutcome {
        error!("Error {} {}: {}", action, R::NAME, e);
        SyncOutcome::Failed(e)
    }
}

impl SyncClient<Todo> {
    pub fn begin_toggle(&self, id: &str) -> Pending {
        self.pending(Operation::Toggle(id.to_string()), self.api.build_toggle(id))
    }

    pub fn toggle_completed<T: Transport>(&mut self, id: &str, transport: &T) -> SyncOutcome {
        let pending = self.begin_toggle(id);
        self.run(pending, transport)
    }
}

impl SyncClient<Habit> {
    pub fn begin_check_in(&self, id: &str) -> Pending {
        self.pending(Operation::CheckIn(id.to_string()), self.api.build_check_in(id))
    }

    pub fn check_in<T: Transport>(&mut self, id: &str, transport: &T) -> SyncOutcome {
        let pending = self.begin_check_in(id);
        self.run(pending, transport)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::http::HttpMethod;
    use crate::types::{NewHabit, NewTodo};

    const BASE: &str = "http://localhost:3000";

    /// Answers requests from a queue and records what was sent.
    #[derive(Default)]
    struct Scripted {
        replies: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        fn refuse(self) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Err(ApiError::Transport("connection refused".into())));
            self
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.sent.borrow().clone()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.sent.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected request")
        }
    }

    fn loaded_todos(body: &str) -> TodoSync {
        let mut sync = TodoSync::new(BASE);
        let outcome = sync.load(&Scripted::default().reply(200, body));
        assert_eq!(outcome, SyncOutcome::Committed);
        sync
    }

    fn loaded_habits(body: &str) -> HabitSync {
        let mut sync = HabitSync::new(BASE);
        assert!(sync.load(&Scripted::default().reply(200, body)).is_committed());
        sync
    }

    #[test]
    fn load_replaces_collection_and_sets_loaded() {
        let sync = loaded_todos(
            r#"{"success":true,"data":[{"_id":"1","title":"A"},{"_id":"2","title":"B"}]}"#,
        );
        assert!(sync.is_loaded());
        let titles: Vec<_> = sync.items().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[test]
    fn load_network_failure_leaves_empty_and_clears_loading() {
        let mut sync = TodoSync::new(BASE);
        let outcome = sync.load(&Scripted::default().refuse());
        assert!(matches!(outcome, SyncOutcome::Failed(ApiError::Transport(_))));
        assert!(sync.items().is_empty());
        assert!(sync.is_loaded());
    }

    #[test]
    fn load_application_failure_keeps_previous_items() {
        let mut sync = loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A"}]}"#);
        let before = sync.items().to_vec();
        let outcome = sync.load(&Scripted::default().reply(500, r#"{"success":false,"error":"db"}"#));
        assert_eq!(outcome, SyncOutcome::Failed(ApiError::Application("db".into())));
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn load_commits_items_with_loose_server_shapes() {
        let sync = loaded_todos(
            r#"{"success":true,"data":[{"_id":"1","title":"A"},
                {"_id":"2","id":"2","title":"B","dueDate":"2025-01-09"}]}"#,
        );
        assert_eq!(sync.items().len(), 2);
        assert!(sync.get("2").unwrap().due_date.is_some());

        let habits = loaded_habits(
            r#"{"success":true,"data":[{"_id":"h1","name":"Read","completions":[{"date":"2025-05-01T07:00:00Z"}]}]}"#,
        );
        assert_eq!(habits.get("h1").unwrap().completions.len(), 1);
    }

    #[test]
    fn create_echoing_calendar_due_date_commits() {
        let mut sync = TodoSync::new(BASE);
        let draft = NewTodo {
            due_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 9),
            ..NewTodo::titled("Dentist")
        };
        let transport = Scripted::default().reply(
            201,
            r#"{"success":true,"data":{"_id":"5","title":"Dentist","dueDate":"2025-01-09"}}"#,
        );
        assert_eq!(sync.create(&draft, &transport), SyncOutcome::Committed);
        assert_eq!(sync.items().len(), 1);
    }

    #[test]
    fn create_rejected_by_server_keeps_collection() {
        let mut sync = loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A"}]}"#);
        let before = sync.items().to_vec();
        let transport =
            Scripted::default().reply(400, r#"{"success":false,"error":"Title is required"}"#);
        let outcome = sync.create(&NewTodo::titled("B"), &transport);
        assert_eq!(
            outcome,
            SyncOutcome::Failed(ApiError::Application("Title is required".into()))
        );
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn create_appends_server_representation() {
        let mut sync = loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A"}]}"#);
        let transport = Scripted::default().reply(
            201,
            r#"{"success":true,"data":{"_id":"9","title":"Buy milk","priority":"medium","completed":false,"createdAt":"2025-01-01T00:00:00Z"}}"#,
        );
        let outcome = sync.create(&NewTodo::titled("Buy milk"), &transport);
        assert_eq!(outcome, SyncOutcome::Committed);
        assert_eq!(sync.items().len(), 2);
        let last = sync.items().last().unwrap();
        assert_eq!(last.id, "9");
        assert!(last.extra.contains_key("createdAt"));
    }

    #[test]
    fn create_with_blank_title_sends_nothing() {
        let mut sync = TodoSync::new(BASE);
        let transport = Scripted::default();
        let outcome = sync.create(&NewTodo::titled("  "), &transport);
        assert!(matches!(outcome, SyncOutcome::Failed(ApiError::Validation(_))));
        assert!(transport.sent().is_empty());
        assert!(sync.items().is_empty());
    }

    #[test]
    fn failed_create_leaves_collection_unchanged() {
        let mut sync = loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A"}]}"#);
        let before = sync.items().to_vec();
        let outcome = sync.create(&NewTodo::titled("B"), &Scripted::default().refuse());
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn toggle_replaces_item_with_server_copy() {
        let mut sync =
            loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A","completed":false}]}"#);
        let transport = Scripted::default().reply(
            200,
            r#"{"success":true,"data":{"_id":"1","title":"A","completed":true}}"#,
        );
        assert!(sync.toggle_completed("1", &transport).is_committed());

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Patch);
        assert_eq!(sent[0].path, format!("{BASE}/todos/1/toggle"));

        let expected: Vec<Todo> =
            serde_json::from_str(r#"[{"_id":"1","title":"A","completed":true}]"#).unwrap();
        assert_eq!(sync.items(), expected.as_slice());
    }

    #[test]
    fn toggle_does_not_flip_ahead_of_server() {
        let mut sync =
            loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A","completed":false}]}"#);
        let pending = sync.begin_toggle("1");
        assert!(!sync.get("1").unwrap().completed);

        // The server says it is still open; the client must agree.
        let outcome = sync.complete(
            pending,
            Ok(HttpResponse::new(
                200,
                r#"{"success":true,"data":{"_id":"1","title":"A (renamed)","completed":false}}"#,
            )),
        );
        assert!(outcome.is_committed());
        let todo = sync.get("1").unwrap();
        assert!(!todo.completed);
        assert_eq!(todo.title, "A (renamed)");
    }

    #[test]
    fn failed_toggle_leaves_collection_unchanged() {
        let mut sync =
            loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A","completed":false}]}"#);
        let before = sync.items().to_vec();
        let outcome = sync.toggle_completed(
            "1",
            &Scripted::default().reply(404, r#"{"success":false,"error":"Todo not found"}"#),
        );
        assert!(matches!(outcome, SyncOutcome::Failed(ApiError::Application(_))));
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn check_in_replaces_habit() {
        let mut sync = loaded_habits(
            r#"{"success":true,"data":[{"_id":"h1","name":"Read","streak":2,"completions":[]}]}"#,
        );
        let transport = Scripted::default().reply(
            200,
            r#"{"success":true,"data":{"_id":"h1","name":"Read","streak":3,
                "lastCheckIn":"2025-05-02T08:00:00Z","completions":["2025-05-02T08:00:00Z"]}}"#,
        );
        assert!(sync.check_in("h1", &transport).is_committed());
        let habit = sync.get("h1").unwrap();
        assert_eq!(habit.streak, 3);
        assert_eq!(habit.completions.len(), 1);
        assert!(habit.last_check_in.is_some());
    }

    #[test]
    fn rejected_check_in_surfaces_server_text() {
        let mut sync = loaded_habits(
            r#"{"success":true,"data":[{"_id":"h1","name":"Read","streak":2,"completions":[]}]}"#,
        );
        let before = sync.items().to_vec();
        let outcome = sync.check_in(
            "h1",
            &Scripted::default().reply(400, r#"{"success":false,"error":"Already checked in today!"}"#),
        );
        assert_eq!(outcome.notice(), Some("Already checked in today!"));
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn rejected_check_in_without_text_uses_fallback() {
        let mut sync = HabitSync::new(BASE);
        let outcome = sync.check_in("h1", &Scripted::default().reply(400, r#"{"success":false}"#));
        assert_eq!(outcome, SyncOutcome::Notice(CHECK_IN_REJECTED.to_string()));
    }

    #[test]
    fn check_in_transport_failure_is_not_user_facing() {
        let mut sync = HabitSync::new(BASE);
        let outcome = sync.check_in("h1", &Scripted::default().refuse());
        assert!(matches!(outcome, SyncOutcome::Failed(ApiError::Transport(_))));
        assert_eq!(outcome.notice(), None);
    }

    #[test]
    fn remove_drops_item_after_ack() {
        let mut sync = loaded_habits(
            r#"{"success":true,"data":[{"_id":"h1","name":"Read"},{"_id":"h2","name":"Run"}]}"#,
        );
        let outcome = sync.remove("h1", &Scripted::default().reply(200, r#"{"success":true}"#));
        assert!(outcome.is_committed());
        assert_eq!(sync.items().len(), 1);
        assert_eq!(sync.items()[0].id, "h2");
    }

    #[test]
    fn remove_of_absent_id_changes_nothing() {
        let mut sync = loaded_habits(r#"{"success":true,"data":[{"_id":"h2","name":"Run"}]}"#);
        let before = sync.items().to_vec();

        let ok = sync.remove("gone", &Scripted::default().reply(200, r#"{"success":true}"#));
        assert!(ok.is_committed());
        assert_eq!(sync.items(), before.as_slice());

        let missing = sync.remove(
            "gone",
            &Scripted::default().reply(404, r#"{"success":false,"error":"Habit not found"}"#),
        );
        assert!(matches!(missing, SyncOutcome::Failed(_)));
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn failed_remove_keeps_item() {
        let mut sync = loaded_habits(r#"{"success":true,"data":[{"_id":"h1","name":"Read"}]}"#);
        let outcome = sync.remove("h1", &Scripted::default().refuse());
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert!(sync.get("h1").is_some());
    }

    #[test]
    fn responses_after_detach_are_dropped() {
        let mut sync = loaded_todos(r#"{"success":true,"data":[{"_id":"1","title":"A"}]}"#);
        let before = sync.items().to_vec();
        let toggle = sync.begin_toggle("1");
        let create = sync.begin_create(&NewTodo::titled("B")).unwrap();

        sync.detach();

        let outcome = sync.complete(
            toggle,
            Ok(HttpResponse::new(
                200,
                r#"{"success":true,"data":{"_id":"1","title":"A","completed":true}}"#,
            )),
        );
        assert_eq!(outcome, SyncOutcome::Stale);
        let outcome = sync.complete(
            create,
            Ok(HttpResponse::new(
                201,
                r#"{"success":true,"data":{"_id":"2","title":"B"}}"#,
            )),
        );
        assert_eq!(outcome, SyncOutcome::Stale);
        assert_eq!(sync.items(), before.as_slice());

        // Work begun after the detach applies as usual.
        let pending = sync.begin_remove("1");
        let outcome = sync.complete(pending, Ok(HttpResponse::new(200, r#"{"success":true}"#)));
        assert!(outcome.is_committed());
        assert!(sync.items().is_empty());
    }

    #[test]
    fn stale_load_does_not_mark_loaded() {
        let mut sync = TodoSync::new(BASE);
        let pending = sync.begin_load();
        sync.detach();
        let outcome = sync.complete(pending, Err(ApiError::Transport("late".into())));
        assert_eq!(outcome, SyncOutcome::Stale);
        assert!(!sync.is_loaded());
    }

    #[test]
    fn duplicate_creates_are_not_deduplicated() {
        let mut sync = HabitSync::new(BASE);
        let first = sync.begin_create(&NewHabit::named("Run")).unwrap();
        let second = sync.begin_create(&NewHabit::named("Run")).unwrap();
        assert_eq!(first.request(), second.request());

        sync.complete(
            second,
            Ok(HttpResponse::new(201, r#"{"success":true,"data":{"_id":"b","name":"Run"}}"#)),
        );
        sync.complete(
            first,
            Ok(HttpResponse::new(201, r#"{"success":true,"data":{"_id":"a","name":"Run"}}"#)),
        );
        let ids: Vec<_> = sync.items().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}

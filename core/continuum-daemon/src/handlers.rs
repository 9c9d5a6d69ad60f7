use chrono::{DateTime, Local};
use continuum_core::{ActivityKind, DocumentStore, MemoryDocument};
use continuum_protocol::{
    parse_history, parse_log_note, parse_phase, parse_task, Method, Request, Response,
    PROTOCOL_VERSION,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::state::SharedState;

pub fn handle_request<S: DocumentStore<MemoryDocument>>(
    request: Request,
    state: &SharedState<S>,
) -> Response {
    handle_request_at(request, state, Local::now())
}

pub fn handle_request_at<S: DocumentStore<MemoryDocument>>(
    request: Request,
    state: &SharedState<S>,
    now: DateTime<Local>,
) -> Response {
    if request.protocol_version != PROTOCOL_VERSION {
        return Response::error(
            request.id,
            "protocol_mismatch",
            "unsupported protocol version",
        );
    }

    let id = request.id;
    match request.method {
        Method::GetHealth => Response::ok(
            id,
            json!({
                "status": "healthy",
                "memory_file_exists": state.memory_file_exists(),
                "pid": std::process::id(),
                "version": env!("CARGO_PKG_VERSION"),
                "protocol_version": PROTOCOL_VERSION,
            }),
        ),
        Method::GetSummary => {
            let summary = state.read(|memory| memory.summary());
            match serde_json::to_value(summary) {
                Ok(value) => Response::ok(id, value),
                Err(err) => Response::error(
                    id,
                    "serialization_error",
                    format!("Failed to serialize summary: {}", err),
                ),
            }
        }
        Method::GetContext => {
            let context = state.read(|memory| memory.context());
            Response::ok(id, json!({ "context": context }))
        }
        Method::GetHistory => {
            let params = match parse_history(request.params) {
                Ok(params) => params,
                Err(err) => return Response::error_with_info(id, err),
            };
            let kind = params.kind.as_deref().map(ActivityKind::from);
            let limit = params.effective_limit();
            let history = state.read(|memory| memory.history(kind.as_ref(), limit));
            debug!(kind = ?kind, limit, entries = history.len(), "History request");
            Response::ok(id, json!({ "history": history }))
        }
        Method::GetTasks => {
            let tasks = state.read(|memory| memory.next_tasks.clone());
            Response::ok(id, json!({ "next_tasks": tasks }))
        }
        Method::LogNote => {
            let params = match parse_log_note(request.params) {
                Ok(params) => params,
                Err(err) => return Response::error_with_info(id, err),
            };
            let kind = ActivityKind::from(params.kind);
            match state.update(|memory| memory.log_note(now, params.notes.as_str(), kind)) {
                Ok(record) => {
                    info!(notes = %record.notes, kind = %record.kind, "Note logged");
                    Response::ok(id, json!({ "status": "logged", "entry": record.notes }))
                }
                Err(err) => storage_error(id, err),
            }
        }
        Method::SetPhase => {
            let params = match parse_phase(request.params) {
                Ok(params) => params,
                Err(err) => return Response::error_with_info(id, err),
            };
            match state.update(|memory| memory.set_phase(params.phase.as_str())) {
                Ok(()) => {
                    info!(phase = %params.phase, "Phase set");
                    Response::ok(id, json!({ "status": "phase_set", "phase": params.phase }))
                }
                Err(err) => storage_error(id, err),
            }
        }
        Method::AddTask => {
            let params = match parse_task(request.params) {
                Ok(params) => params,
                Err(err) => return Response::error_with_info(id, err),
            };
            match state.update(|memory| memory.add_task(params.task.as_str())) {
                Ok(()) => {
                    info!(task = %params.task, "Task added");
                    Response::ok(id, json!({ "status": "task_added", "task": params.task }))
                }
                Err(err) => storage_error(id, err),
            }
        }
        Method::CompleteTask => {
            let params = match parse_task(request.params) {
                Ok(params) => params,
                Err(err) => return Response::error_with_info(id, err),
            };
            match state.update(|memory| memory.complete_task(now, &params.task)) {
                Ok(removed) => {
                    info!(task = %params.task, removed, "Task completed");
                    Response::ok(
                        id,
                        json!({ "status": "task_completed", "task": params.task, "removed": removed }),
                    )
                }
                Err(err) => storage_error(id, err),
            }
        }
    }
}

fn storage_error(id: Option<String>, err: continuum_core::ContinuumError) -> Response {
    warn!(error = %err, "Failed to persist memory document");
    Response::error(
        id,
        "storage_error",
        format!("Failed to persist memory document: {}", err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use continuum_core::InMemoryStore;
    use serde_json::Value;

    fn now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 17, 14, 30, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn state() -> SharedState<InMemoryStore<MemoryDocument>> {
        SharedState::new(InMemoryStore::new())
    }

    fn call(
        state: &SharedState<InMemoryStore<MemoryDocument>>,
        method: Method,
        params: Option<Value>,
    ) -> Response {
        handle_request_at(Request::new(method, params).with_id("t"), state, now())
    }

    fn data(response: Response) -> Value {
        assert!(response.ok, "response not ok: {:?}", response.error);
        response.data.expect("data")
    }

    #[test]
    fn rejects_other_protocol_versions() {
        let state = state();
        let mut request = Request::new(Method::GetHealth, None);
        request.protocol_version = PROTOCOL_VERSION + 1;
        let response = handle_request_at(request, &state, now());
        assert!(!response.ok);
        assert_eq!(response.error.expect("error").code, "protocol_mismatch");
    }

    #[test]
    fn health_reports_memory_file_presence() {
        let state = state();
        let health = data(call(&state, Method::GetHealth, None));
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["memory_file_exists"], false);

        call(&state, Method::SetPhase, Some(json!({"phase": "MVP"})));
        let health = data(call(&state, Method::GetHealth, None));
        assert_eq!(health["memory_file_exists"], true);
    }

    #[test]
    fn write_then_read_round_trip() {
        let state = state();
        data(call(&state, Method::SetPhase, Some(json!({"phase": "MVP"}))));
        data(call(&state, Method::AddTask, Some(json!({"task": "write docs"}))));
        data(call(
            &state,
            Method::LogNote,
            Some(json!({"notes": "Refactored auth"})),
        ));

        let summary = data(call(&state, Method::GetSummary, None));
        assert_eq!(summary["current_phase"], "MVP");
        assert_eq!(summary["next_tasks"], json!(["write docs"]));
        assert_eq!(summary["last_steps"][0]["notes"], "Refactored auth");
        assert_eq!(summary["last_steps"][0]["type"], "note");
        assert_eq!(summary["last_steps"][0]["date"], "2026-10-17 14:30");

        let context = data(call(&state, Method::GetContext, None));
        let text = context["context"].as_str().expect("context text");
        assert!(text.starts_with("PROJECT CONTEXT:\nPhase: MVP\n"));
        assert!(text.contains("- Refactored auth\n"));
        assert!(text.ends_with("Next tasks:\n- write docs\n"));
    }

    #[test]
    fn complete_task_removes_pending_and_logs_completion() {
        let state = state();
        call(&state, Method::AddTask, Some(json!({"task": "write docs"})));

        let done = data(call(
            &state,
            Method::CompleteTask,
            Some(json!({"task": "write docs"})),
        ));
        assert_eq!(done["status"], "task_completed");
        assert_eq!(done["removed"], true);

        let tasks = data(call(&state, Method::GetTasks, None));
        assert_eq!(tasks["next_tasks"], json!([]));

        let history = data(call(
            &state,
            Method::GetHistory,
            Some(json!({"type": "completion"})),
        ));
        assert_eq!(history["history"][0]["notes"], "Completed: write docs");
    }

    #[test]
    fn completing_unknown_task_still_succeeds() {
        let state = state();
        let done = data(call(
            &state,
            Method::CompleteTask,
            Some(json!({"task": "never added"})),
        ));
        assert_eq!(done["removed"], false);
    }

    #[test]
    fn history_honors_limit() {
        let state = state();
        for i in 0..5 {
            call(
                &state,
                Method::LogNote,
                Some(json!({"notes": format!("note {}", i), "type": "development"})),
            );
        }
        let history = data(call(&state, Method::GetHistory, Some(json!({"limit": 2}))));
        assert_eq!(history["history"].as_array().expect("array").len(), 2);
    }

    #[test]
    fn invalid_params_are_reported() {
        let state = state();
        let response = call(&state, Method::AddTask, None);
        assert!(!response.ok);
        assert_eq!(response.error.expect("error").code, "invalid_params");

        let response = call(&state, Method::LogNote, Some(json!({"note": "typo"})));
        assert_eq!(response.error.expect("error").code, "invalid_params");
    }
}

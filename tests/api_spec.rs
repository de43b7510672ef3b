use std::future::IntoFuture;

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use mission_control::api::{create_router, AppState};
use mission_control::config::Config;
use mission_control::db::Database;
use mission_control::models::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Deserialize)]
struct Body<T> {
    success: bool,
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

fn setup() -> (TestServer, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db.seed_agents().expect("Failed to seed agents");
    let state = AppState::new(db.clone(), Config::with_gateway("http://127.0.0.1:1", None));
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");
    (server, db)
}

fn data<T: DeserializeOwned>(response: &TestResponse) -> T {
    let body: Body<T> = response.json();
    assert!(body.success);
    body.data
}

fn error(response: &TestResponse) -> String {
    let body: ErrorBody = response.json();
    assert!(!body.success);
    body.error
}

fn agent(db: &Database, name: &str) -> Agent {
    db.get_agent_by_name(name)
        .expect("Query failed")
        .expect("Seeded agent missing")
}

async fn create_task(server: &TestServer, body: Value) -> TaskWithRelations {
    let response = server.post("/api/tasks").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    data(&response)
}

async fn activities(server: &TestServer, query: &str) -> Vec<ActivityWithRelations> {
    data(&server.get(&format!("/api/activities?{}", query)).await)
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn creates_task_in_inbox_owned_by_coordinator() {
        let (server, _db) = setup();

        let task = create_task(&server, json!({ "title": "Fix bug", "priority": "high" })).await;

        assert_eq!(task.task.status, TaskStatus::Inbox);
        assert_eq!(task.task.priority, TaskPriority::High);
        assert_eq!(task.created_by.name, "clawdbot");

        let logged = activities(&server, &format!("taskId={}&type=task_created", task.task.id)).await;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].activity.message, "Task \"Fix bug\" created");
    }

    #[tokio::test]
    async fn creates_task_with_initial_assignees() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");

        let task = create_task(
            &server,
            json!({ "title": "API work", "assigneeIds": [friday.id, friday.id] }),
        )
        .await;

        assert_eq!(task.assignee_ids(), vec![friday.id]);
        assert_eq!(task.task.priority, TaskPriority::Medium);
    }

    #[tokio::test]
    async fn rejects_empty_title() {
        let (server, _db) = setup();

        let response = server.post("/api/tasks").json(&json!({ "title": "  " })).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error(&response), "title is required");
    }

    #[tokio::test]
    async fn rejects_unknown_priority() {
        let (server, _db) = setup();

        let response = server
            .post("/api/tasks")
            .json(&json!({ "title": "Task", "priority": "critical" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let (server, _db) = setup();

        let response = server
            .post("/api/tasks")
            .bytes("{ not json".into())
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn rejects_unknown_assignee() {
        let (server, _db) = setup();

        let response = server
            .post("/api/tasks")
            .json(&json!({ "title": "Task", "assigneeIds": [Uuid::new_v4()] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let (server, _db) = setup();
        let task = create_task(&server, json!({ "title": "Moving" })).await;
        server
            .patch(&format!("/api/tasks/{}", task.task.id))
            .json(&json!({ "status": "review" }))
            .await
            .assert_status_ok();

        let review: Vec<TaskWithRelations> = data(&server.get("/api/tasks?status=review").await);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].task.title, "Moving");

        let inbox: Vec<TaskWithRelations> = data(&server.get("/api/tasks?status=inbox").await);
        assert!(inbox.iter().all(|t| t.task.status == TaskStatus::Inbox));
        assert!(inbox.iter().all(|t| t.task.id != task.task.id));
    }

    #[tokio::test]
    async fn returns_404_for_unknown_task() {
        let (server, _db) = setup();

        let response = server.get(&format!("/api/tasks/{}", Uuid::new_v4())).await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(error(&response), "Task not found");
    }

    #[tokio::test]
    async fn returns_400_for_malformed_id() {
        let (server, _db) = setup();

        let response = server.get("/api/tasks/not-a-uuid").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn detail_includes_thread_and_recent_activity() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        let task = create_task(&server, json!({ "title": "Detail" })).await;

        server
            .post("/api/messages")
            .json(&json!({ "taskId": task.task.id, "agentId": friday.id, "content": "On it" }))
            .await
            .assert_status(StatusCode::CREATED);

        let detail: TaskDetail = data(&server.get(&format!("/api/tasks/{}", task.task.id)).await);

        assert_eq!(detail.messages.len(), 1);
        assert_eq!(detail.messages[0].agent.name, "friday");
        let kinds: Vec<&str> = detail
            .activities
            .iter()
            .map(|a| a.activity.activity_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["message_sent", "task_created"]);
    }

    #[tokio::test]
    async fn deletes_task() {
        let (server, _db) = setup();
        let task = create_task(&server, json!({ "title": "Doomed" })).await;

        server
            .delete(&format!("/api/tasks/{}", task.task.id))
            .await
            .assert_status_ok();

        server
            .get(&format!("/api/tasks/{}", task.task.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod task_updates {
    use super::*;

    #[tokio::test]
    async fn logs_one_status_change_with_from_and_to() {
        let (server, _db) = setup();
        let task = create_task(&server, json!({ "title": "Pipeline" })).await;

        let response = server
            .patch(&format!("/api/tasks/{}", task.task.id))
            .json(&json!({ "status": "in_progress" }))
            .await;
        response.assert_status_ok();
        let updated: TaskWithRelations = data(&response);
        assert_eq!(updated.task.status, TaskStatus::InProgress);

        let changes =
            activities(&server, &format!("taskId={}&type=status_changed", task.task.id)).await;
        assert_eq!(changes.len(), 1);
        let metadata = changes[0].activity.metadata.clone().expect("metadata missing");
        assert_eq!(metadata["from"], "inbox");
        assert_eq!(metadata["to"], "in_progress");
    }

    #[tokio::test]
    async fn does_not_log_when_status_is_unchanged() {
        let (server, _db) = setup();
        let task = create_task(&server, json!({ "title": "Still" })).await;

        server
            .patch(&format!("/api/tasks/{}", task.task.id))
            .json(&json!({ "status": "inbox", "title": "Still here" }))
            .await
            .assert_status_ok();

        let changes =
            activities(&server, &format!("taskId={}&type=status_changed", task.task.id)).await;
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn replaces_assignees_and_logs_each_listed_agent() {
        let (server, db) = setup();
        let a = agent(&db, "friday");
        let b = agent(&db, "pixel");
        let c = agent(&db, "fury");
        let task = create_task(&server, json!({ "title": "Team", "assigneeIds": [a.id, b.id] })).await;

        let response = server
            .patch(&format!("/api/tasks/{}", task.task.id))
            .json(&json!({ "assigneeIds": [b.id, c.id] }))
            .await;
        response.assert_status_ok();
        let updated: TaskWithRelations = data(&response);

        let mut ids = updated.assignee_ids();
        ids.sort();
        let mut expected = vec![b.id, c.id];
        expected.sort();
        assert_eq!(ids, expected);

        let assigned =
            activities(&server, &format!("taskId={}&type=task_assigned", task.task.id)).await;
        let mut logged: Vec<Uuid> = assigned.iter().map(|a| a.activity.agent_id).collect();
        logged.sort();
        assert_eq!(logged, expected);
    }

    #[tokio::test]
    async fn repeated_assignee_is_assigned_and_logged_once() {
        let (server, db) = setup();
        let b = agent(&db, "pixel");
        let task = create_task(&server, json!({ "title": "Echo" })).await;

        let updated: TaskWithRelations = data(
            &server
                .patch(&format!("/api/tasks/{}", task.task.id))
                .json(&json!({ "assigneeIds": [b.id, b.id] }))
                .await,
        );

        assert_eq!(updated.assignee_ids(), vec![b.id]);
        let assigned =
            activities(&server, &format!("taskId={}&type=task_assigned", task.task.id)).await;
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].activity.agent_id, b.id);
    }

    #[tokio::test]
    async fn clears_description_with_null() {
        let (server, _db) = setup();
        let task = create_task(&server, json!({ "title": "Doc", "description": "Old" })).await;

        let updated: TaskWithRelations = data(
            &server
                .patch(&format!("/api/tasks/{}", task.task.id))
                .json(&json!({ "description": null }))
                .await,
        );

        assert!(updated.task.description.is_none());
    }

    #[tokio::test]
    async fn returns_404_for_unknown_task() {
        let (server, _db) = setup();

        let response = server
            .patch(&format!("/api/tasks/{}", Uuid::new_v4()))
            .json(&json!({ "status": "done" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

mod messages {
    use super::*;

    #[tokio::test]
    async fn notifies_mentioned_agent_and_subscribes_participants() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        let pixel = agent(&db, "pixel");
        let task = create_task(&server, json!({ "title": "Review UI" })).await;

        let response = server
            .post("/api/messages")
            .json(&json!({
                "taskId": task.task.id,
                "agentId": friday.id,
                "content": "@pixel please review",
                "mentions": [pixel.id],
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let message: MessageWithAgent = data(&response);
        assert_eq!(message.agent.name, "friday");
        assert_eq!(message.message.mentions, Some(vec![pixel.id]));

        let pending: Vec<NotificationWithRelations> = data(
            &server
                .get(&format!("/api/notifications?agentId={}&undelivered=true", pixel.id))
                .await,
        );
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].notification.delivered);
        assert_eq!(pending[0].notification.message_id, Some(message.message.id));
        assert_eq!(
            pending[0].message.as_ref().map(|m| m.task.id),
            Some(task.task.id)
        );

        let subscribers: Vec<Uuid> = db
            .get_thread_subscriptions(task.task.id)
            .expect("Query failed")
            .into_iter()
            .map(|s| s.agent_id)
            .collect();
        assert_eq!(subscribers.len(), 2);
        assert!(subscribers.contains(&pixel.id));
        assert!(subscribers.contains(&friday.id));
    }

    #[tokio::test]
    async fn resolves_mentions_from_content_when_omitted() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        let fury = agent(&db, "fury");
        let task = create_task(&server, json!({ "title": "Research" })).await;

        let message: MessageWithAgent = data(
            &server
                .post("/api/messages")
                .json(&json!({
                    "taskId": task.task.id,
                    "agentId": friday.id,
                    "content": "@Fury can you dig into this? cc @nobody",
                }))
                .await,
        );

        assert_eq!(message.message.mentions, Some(vec![fury.id]));
        let pending: Vec<NotificationWithRelations> =
            data(&server.get(&format!("/api/notifications?agentId={}", fury.id)).await);
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn does_not_notify_the_author() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        let task = create_task(&server, json!({ "title": "Solo" })).await;

        server
            .post("/api/messages")
            .json(&json!({
                "taskId": task.task.id,
                "agentId": friday.id,
                "content": "note to @friday",
                "mentions": [friday.id],
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let pending: Vec<NotificationWithRelations> =
            data(&server.get(&format!("/api/notifications?agentId={}", friday.id)).await);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn lists_thread_oldest_first() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        let task = create_task(&server, json!({ "title": "Chat" })).await;

        for content in ["first", "second"] {
            server
                .post("/api/messages")
                .json(&json!({ "taskId": task.task.id, "agentId": friday.id, "content": content }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let thread: Vec<MessageWithAgent> =
            data(&server.get(&format!("/api/messages?taskId={}", task.task.id)).await);
        let contents: Vec<&str> = thread.iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn requires_task_id_to_list() {
        let (server, _db) = setup();

        let response = server.get("/api/messages").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error(&response), "taskId is required");
    }

    #[tokio::test]
    async fn returns_404_for_unknown_task() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");

        let response = server
            .post("/api/messages")
            .json(&json!({ "taskId": Uuid::new_v4(), "agentId": friday.id, "content": "hi" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_missing_content() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        let task = create_task(&server, json!({ "title": "Quiet" })).await;

        let response = server
            .post("/api/messages")
            .json(&json!({ "taskId": task.task.id, "agentId": friday.id }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod agents {
    use super::*;

    #[tokio::test]
    async fn lists_seeded_roster_by_name() {
        let (server, _db) = setup();

        let agents: Vec<AgentSummary> = data(&server.get("/api/agents").await);

        let names: Vec<&str> = agents.iter().map(|a| a.agent.name.as_str()).collect();
        assert_eq!(names, vec!["clawdbot", "friday", "fury", "pixel"]);
    }

    #[tokio::test]
    async fn counts_created_tasks_and_assignments() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");
        create_task(&server, json!({ "title": "One", "createdById": friday.id, "assigneeIds": [friday.id] })).await;

        let agents: Vec<AgentSummary> = data(&server.get("/api/agents").await);
        let summary = agents
            .iter()
            .find(|a| a.agent.id == friday.id)
            .expect("friday missing");
        assert_eq!(summary.counts.created_tasks, 1);
        assert_eq!(summary.counts.assignments, 1);
        assert_eq!(summary.counts.messages, 0);
    }

    #[tokio::test]
    async fn updates_status_and_current_task() {
        let (server, db) = setup();
        let pixel = agent(&db, "pixel");
        let task = create_task(&server, json!({ "title": "Polish" })).await;

        let response = server
            .patch("/api/agents")
            .json(&json!({ "id": pixel.id, "status": "active", "currentTaskId": task.task.id }))
            .await;
        response.assert_status_ok();
        let updated: Agent = data(&response);
        assert_eq!(updated.status, AgentStatus::Active);
        assert_eq!(updated.current_task_id, Some(task.task.id));

        let cleared: Agent = data(
            &server
                .patch("/api/agents")
                .json(&json!({ "id": pixel.id, "currentTaskId": null }))
                .await,
        );
        assert_eq!(cleared.status, AgentStatus::Active);
        assert!(cleared.current_task_id.is_none());
    }

    #[tokio::test]
    async fn rejects_update_without_id() {
        let (server, _db) = setup();

        let response = server.patch("/api/agents").json(&json!({ "status": "active" })).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn returns_404_for_unknown_agent() {
        let (server, _db) = setup();

        let response = server
            .patch("/api/agents")
            .json(&json!({ "id": Uuid::new_v4(), "status": "blocked" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(error(&response), "Agent not found");
    }

    #[tokio::test]
    async fn creates_agent_and_rejects_duplicate_name() {
        let (server, _db) = setup();
        let body = json!({
            "name": "wanda",
            "displayName": "Wanda",
            "role": "QA",
            "sessionKey": "agent:qa:main",
        });

        let response = server.post("/api/agents").json(&body).await;
        response.assert_status(StatusCode::CREATED);
        let created: Agent = data(&response);
        assert_eq!(created.status, AgentStatus::Idle);

        server
            .post("/api/agents")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn concurrent_creates_with_one_name_yield_one_agent() {
        let (server, db) = setup();
        let body = json!({
            "name": "Vision",
            "displayName": "Vision",
            "role": "QA",
            "sessionKey": "agent:qa:main",
        });
        let lower = json!({
            "name": "vision",
            "displayName": "Vision",
            "role": "QA",
            "sessionKey": "agent:qa:main",
        });

        let (first, second) = tokio::join!(
            server.post("/api/agents").json(&body).into_future(),
            server.post("/api/agents").json(&lower).into_future()
        );

        let mut statuses = vec![first.status_code(), second.status_code()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
        let loser = if first.status_code() == StatusCode::BAD_REQUEST { &first } else { &second };
        assert!(error(loser).starts_with("Agent name already taken"));
        assert_eq!(db.get_all_agents().expect("Query failed").len(), 5);
    }
}

mod documents {
    use super::*;

    #[tokio::test]
    async fn creates_document_and_logs_activity() {
        let (server, db) = setup();
        let fury = agent(&db, "fury");
        let task = create_task(&server, json!({ "title": "Investigate" })).await;

        let response = server
            .post("/api/documents")
            .json(&json!({
                "title": "Findings",
                "content": "It was DNS.",
                "type": "research",
                "taskId": task.task.id,
                "agentId": fury.id,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let document: DocumentWithRelations = data(&response);
        assert_eq!(document.document.doc_type, DocumentType::Research);
        assert_eq!(document.task.map(|t| t.id), Some(task.task.id));

        let logged = activities(&server, "type=document_created").await;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].activity.message, "Created document: Findings");
    }

    #[tokio::test]
    async fn updates_filters_and_deletes() {
        let (server, db) = setup();
        let fury = agent(&db, "fury");

        let document: DocumentWithRelations = data(
            &server
                .post("/api/documents")
                .json(&json!({ "title": "Draft", "content": "v1", "type": "note", "agentId": fury.id }))
                .await,
        );

        let updated: DocumentWithRelations = data(
            &server
                .patch("/api/documents")
                .json(&json!({ "id": document.document.id, "content": "v2", "type": "protocol" }))
                .await,
        );
        assert_eq!(updated.document.content, "v2");
        assert_eq!(updated.document.title, "Draft");

        let protocols: Vec<DocumentWithRelations> =
            data(&server.get("/api/documents?type=protocol").await);
        assert_eq!(protocols.len(), 1);

        server
            .delete(&format!("/api/documents?id={}", document.document.id))
            .await
            .assert_status_ok();
        let remaining: Vec<DocumentWithRelations> = data(&server.get("/api/documents").await);
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn delete_requires_id() {
        let (server, _db) = setup();

        server
            .delete("/api/documents")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unknown_type() {
        let (server, db) = setup();
        let fury = agent(&db, "fury");

        let response = server
            .post("/api/documents")
            .json(&json!({ "title": "X", "content": "", "type": "memo", "agentId": fury.id }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod activities {
    use super::*;

    #[tokio::test]
    async fn records_external_activity_with_metadata() {
        let (server, db) = setup();
        let pixel = agent(&db, "pixel");

        let response = server
            .post("/api/activities")
            .json(&json!({
                "type": "deployment",
                "agentId": pixel.id,
                "message": "Deployed preview",
                "metadata": { "env": "staging" },
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let activity: ActivityWithRelations = data(&response);
        assert_eq!(activity.agent.name, "pixel");
        assert!(activity.task.is_none());

        let feed = activities(&server, "type=deployment").await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].activity.metadata, Some(json!({ "env": "staging" })));
    }

    #[tokio::test]
    async fn honours_limit_newest_first() {
        let (server, db) = setup();
        let pixel = agent(&db, "pixel");
        for n in 0..3 {
            server
                .post("/api/activities")
                .json(&json!({ "type": "ping", "agentId": pixel.id, "message": format!("ping {}", n) }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let feed = activities(&server, "type=ping&limit=2").await;

        let messages: Vec<&str> = feed.iter().map(|a| a.activity.message.as_str()).collect();
        assert_eq!(messages, vec!["ping 2", "ping 1"]);
    }
}

mod notifications {
    use super::*;

    async fn mention(server: &TestServer, db: &Database, target: &str) -> Uuid {
        let friday = agent(db, "friday");
        let target = agent(db, target);
        let task = create_task(server, json!({ "title": "Ping" })).await;
        server
            .post("/api/messages")
            .json(&json!({
                "taskId": task.task.id,
                "agentId": friday.id,
                "content": "hey",
                "mentions": [target.id],
            }))
            .await
            .assert_status(StatusCode::CREATED);
        target.id
    }

    #[tokio::test]
    async fn acknowledges_by_agent() {
        let (server, db) = setup();
        let pixel_id = mention(&server, &db, "pixel").await;

        let result: MarkDeliveredResult = data(
            &server
                .patch("/api/notifications")
                .json(&json!({ "agentId": pixel_id }))
                .await,
        );
        assert_eq!(result.updated, 1);

        let all: Vec<NotificationWithRelations> =
            data(&server.get(&format!("/api/notifications?agentId={}", pixel_id)).await);
        assert!(all[0].notification.delivered);
        assert_eq!(
            all[0].notification.delivery_outcome,
            Some(DeliveryOutcome::Acknowledged)
        );

        let again: MarkDeliveredResult = data(
            &server
                .patch("/api/notifications")
                .json(&json!({ "agentId": pixel_id }))
                .await,
        );
        assert_eq!(again.updated, 0);
    }

    #[tokio::test]
    async fn acknowledges_by_id() {
        let (server, db) = setup();
        let pixel_id = mention(&server, &db, "pixel").await;
        let fury_id = mention(&server, &db, "fury").await;

        let pixel_pending: Vec<NotificationWithRelations> =
            data(&server.get(&format!("/api/notifications?agentId={}", pixel_id)).await);

        let result: MarkDeliveredResult = data(
            &server
                .patch("/api/notifications")
                .json(&json!({ "notificationIds": [pixel_pending[0].notification.id] }))
                .await,
        );
        assert_eq!(result.updated, 1);

        let fury_pending: Vec<NotificationWithRelations> = data(
            &server
                .get(&format!("/api/notifications?agentId={}&undelivered=true", fury_id))
                .await,
        );
        assert_eq!(fury_pending.len(), 1);
    }

    #[tokio::test]
    async fn rejects_acknowledgement_without_selector() {
        let (server, _db) = setup();

        server
            .patch("/api/notifications")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sweep_with_empty_queue_processes_nothing() {
        let (server, _db) = setup();

        let report: Value = data(&server.get("/api/notifications/process").await);

        assert_eq!(report["processed"], json!(0));
        assert_eq!(report["message"], json!("No pending notifications"));
    }
}

mod standup {
    use super::*;

    #[tokio::test]
    async fn summarises_board() {
        let (server, db) = setup();
        let friday = agent(&db, "friday");

        let shipped = create_task(&server, json!({ "title": "Shipped", "assigneeIds": [friday.id] })).await;
        server
            .patch(&format!("/api/tasks/{}", shipped.task.id))
            .json(&json!({ "status": "done" }))
            .await
            .assert_status_ok();

        let working = create_task(&server, json!({ "title": "Working", "assigneeIds": [friday.id] })).await;
        server
            .patch(&format!("/api/tasks/{}", working.task.id))
            .json(&json!({ "status": "in_progress" }))
            .await
            .assert_status_ok();

        let stuck = create_task(&server, json!({ "title": "Stuck", "description": "Waiting on API keys" })).await;
        server
            .patch(&format!("/api/tasks/{}", stuck.task.id))
            .json(&json!({ "status": "blocked" }))
            .await
            .assert_status_ok();

        let report: StandupReport = data(&server.get("/api/standup").await);

        // Welcome task from seeding plus three.
        assert_eq!(report.summary.total_tasks, 4);
        assert_eq!(report.summary.completed, 1);
        assert_eq!(report.summary.in_progress, 1);
        assert_eq!(report.summary.blocked, 1);
        assert_eq!(report.status_counts["inbox"], 1);
        assert_eq!(report.status_counts["review"], 0);

        assert_eq!(report.completed_tasks[0].completed_by, "Friday");
        assert_eq!(report.in_progress_tasks[0].assignees, vec!["Friday"]);
        assert_eq!(
            report.blocked_tasks[0].description.as_deref(),
            Some("Waiting on API keys")
        );

        let friday_row = report
            .agents
            .iter()
            .find(|a| a.name == "Friday")
            .expect("Friday missing");
        assert_eq!(friday_row.tasks.len(), 1);
        assert_eq!(friday_row.tasks[0].title, "Working");
        assert!(report.recent_activities.len() <= 20);
    }
}

mod ui {
    use super::*;

    #[tokio::test]
    async fn serves_dashboard() {
        let (server, _db) = setup();

        let response = server.get("/").await;

        response.assert_status_ok();
        assert!(response.text().contains("Mission Control"));
    }

    #[tokio::test]
    async fn health_reports_unreachable_runtime() {
        let (server, _db) = setup();

        let body: Value = data(&server.get("/api/health").await);

        assert_eq!(body["status"], "ok");
        assert_eq!(body["openclaw"]["connected"], json!(false));
    }
}

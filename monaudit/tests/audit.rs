use monaudit::{
    middleware::{
        AuditMiddleware,
        AuditRequest,
        RequestId,
    },
    sanitize::{
        KeyPatternSanitizer,
        CLEANSED_SUBSTITUTE,
        OPAQUE,
    },
};
use moncore::{
    event::{
        traits::EventBackend,
        EventAction,
        EventUser,
    },
    model::{
        Field,
        ScalarKind,
    },
};
use serde_json::{
    json,
    Value,
};
use std::sync::Arc;
use test_mon::{
    model::TestModel,
    sqlite::create_sqlite_backend,
};

fn provider(pk: Option<i64>, name: &str) -> TestModel {
    TestModel::new("provider", pk)
        .field(Field::scalar("name", ScalarKind::Text, name))
        .field(Field::scalar("client_secret", ScalarKind::Text, "s3cr3t"))
        .field(Field::scalar("access_code_validity", ScalarKind::Integer, "60"))
        .field(Field::scalar("attributes", ScalarKind::Json, json!({"tags": ["a"]})))
        .field(Field::relation("flow_id", 2))
}

#[async_std::test]
async fn update_is_recorded_with_diff() -> anyhow::Result<()> {
    let backend = Arc::new(create_sqlite_backend().await?);
    let middleware = AuditMiddleware::builder(backend.clone()).build();
    let request = AuditRequest::new("PUT", "/api/providers/1/")
        .request_id(RequestId::from("req-1"))
        .user(EventUser::new(1, "akadmin"));

    let id = {
        let _guard = middleware.connect(&request);
        let mut instance = provider(Some(1), "oauth");
        middleware.materialized(&RequestId::from("req-1"), &mut instance)?;
        instance.set("name", "oauth2");
        instance.set("client_secret", "changed");
        instance.set("attributes", json!({"tags": ["a", "b"]}));
        middleware.persisted(&request, &instance, false).await?
    };
    assert_eq!(middleware.hook_count(), 0);

    let events = backend.list_events(Some(EventAction::ModelUpdated)).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(Some(events[0].id), id);
    assert_eq!(events[0].user.username, "akadmin");
    assert_eq!(events[0].context["diff"], json!({
        "added": {
            "root['attributes']['tags'][1]": "b",
        },
        "changed": {
            "root['name']": {"old_value": "oauth", "new_value": "oauth2"},
        },
    }));
    Ok(())
}

#[async_std::test]
async fn created_object_is_all_additions() -> anyhow::Result<()> {
    let backend = Arc::new(create_sqlite_backend().await?);
    let middleware = AuditMiddleware::builder(backend.clone()).build();
    let request = AuditRequest::new("POST", "/api/providers/")
        .request_id(RequestId::generate());
    let _guard = middleware.connect(&request);

    let instance = provider(Some(3), "saml");
    middleware.persisted(&request, &instance, true).await?;

    let events = backend.list_events(Some(EventAction::ModelCreated)).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user, EventUser::anonymous());
    assert_eq!(events[0].context["diff"], json!({
        "added": {
            "root['name']": "saml",
            "root['client_secret']": CLEANSED_SUBSTITUTE,
            "root['access_code_validity']": 60,
            "root['attributes']": {"tags": ["a"]},
        },
    }));
    Ok(())
}

#[async_std::test]
async fn concurrent_requests_are_isolated() -> anyhow::Result<()> {
    let backend = Arc::new(create_sqlite_backend().await?);
    let middleware = AuditMiddleware::builder(backend.clone()).build();

    let tasks = (0..8)
        .map(|i| {
            let middleware = middleware.clone();
            async_std::task::spawn(async move {
                let request_id = RequestId::from(format!("req-{i}"));
                let request = AuditRequest::new("GET", "/api/providers/")
                    .request_id(request_id.clone());
                let _guard = middleware.connect(&request);
                let mut instance = provider(Some(i), &format!("provider-{i}"));
                async_std::task::yield_now().await;
                middleware.materialized(&request_id, &mut instance)?;
                // an object materialized for another request id is not
                // touched by the hook of this request
                let mut other = provider(Some(100 + i), "other");
                middleware.materialized(&RequestId::from("unconnected"), &mut other)?;
                assert!(other.previous.is_none());
                Ok::<_, anyhow::Error>(instance.previous.map(Value::from))
            })
        })
        .collect::<Vec<_>>();

    for (i, task) in tasks.into_iter().enumerate() {
        let previous = task.await?;
        assert_eq!(
            previous.as_ref().map(|v| &v["name"]),
            Some(&json!(format!("provider-{i}"))),
        );
    }
    assert_eq!(middleware.hook_count(), 0);
    Ok(())
}

#[async_std::test]
async fn disconnected_request_captures_nothing() -> anyhow::Result<()> {
    let backend = Arc::new(create_sqlite_backend().await?);
    let middleware = AuditMiddleware::builder(backend.clone()).build();
    let request = AuditRequest::new("PUT", "/api/providers/1/")
        .request_id(RequestId::from("req-1"));
    drop(middleware.connect(&request));

    let mut instance = provider(Some(1), "oauth");
    middleware.materialized(&RequestId::from("req-1"), &mut instance)?;
    assert!(instance.previous.is_none());

    middleware.persisted(&request, &instance, false).await?;
    let events = backend.list_events(None).await?;
    assert_eq!(events.len(), 1);
    assert!(!events[0].context.contains_key("diff"));
    Ok(())
}

#[async_std::test]
async fn change_below_max_depth_is_opaque() -> anyhow::Result<()> {
    let backend = Arc::new(create_sqlite_backend().await?);
    let middleware = AuditMiddleware::builder(backend.clone())
        .sanitizer(Arc::new(KeyPatternSanitizer::default().max_depth(1)))
        .build();
    let request_id = RequestId::generate();
    let request = AuditRequest::new("PATCH", "/api/flows/1/")
        .request_id(request_id.clone());
    let _guard = middleware.connect(&request);

    let mut instance = TestModel::new("flow", Some(1))
        .field(Field::scalar("name", ScalarKind::Text, "default"))
        .field(Field::scalar("layout", ScalarKind::Json, json!({"a": {"b": 1}})));
    middleware.materialized(&request_id, &mut instance)?;
    instance.set("layout", json!({"a": {"b": 2}}));
    middleware.persisted(&request, &instance, false).await?;

    let events = backend.list_events(Some(EventAction::ModelUpdated)).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].context["diff"], json!({
        "changed": {
            "root['layout']": {"old_value": OPAQUE, "new_value": OPAQUE},
        },
    }));
    Ok(())
}

#[async_std::test]
async fn colliding_request_id_keeps_first_connection() -> anyhow::Result<()> {
    let backend = Arc::new(create_sqlite_backend().await?);
    let middleware = AuditMiddleware::builder(backend.clone()).build();
    let request_id = RequestId::from("req-1");
    let first = AuditRequest::new("PUT", "/api/providers/1/")
        .request_id(request_id.clone());
    let second = AuditRequest::new("PUT", "/api/providers/2/")
        .request_id(request_id.clone());

    let first_guard = middleware.connect(&first);
    let second_guard = middleware.connect(&second);
    assert!(second_guard.request_id().is_none());
    drop(second_guard);
    assert!(middleware.is_connected(&request_id));

    let mut instance = provider(Some(1), "oauth");
    middleware.materialized(&request_id, &mut instance)?;
    assert_eq!(
        instance.previous.clone().map(Value::from).map(|v| v["name"].clone()),
        Some(json!("oauth")),
    );
    instance.set("name", "oauth2");
    middleware.persisted(&first, &instance, false).await?;

    drop(first_guard);
    assert_eq!(middleware.hook_count(), 0);

    let events = backend.list_events(None).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].context["diff"], json!({
        "changed": {
            "root['name']": {"old_value": "oauth", "new_value": "oauth2"},
        },
    }));
    Ok(())
}

use axum::{
    extract::{
        Request,
        State,
    },
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use log::debug;
use moncore::event::EventUser;
use crate::middleware::{
    AuditMiddleware,
    AuditRequest,
    RequestId,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Connects the audit hook for the duration of the inner service.
///
/// The `AuditRequest` is made available to handlers as an extension.  The
/// request id is always generated here and echoed back on the response;
/// an `x-request-id` supplied by the client is only logged.
pub async fn audit_layer(
    State(middleware): State<AuditMiddleware>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = RequestId::generate();
    if let Some(value) = request.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        debug!("request {request_id} carries client request id {value:?}");
    }
    let user = request.extensions()
        .get::<EventUser>()
        .cloned()
        .unwrap_or_else(EventUser::anonymous);
    let audit = AuditRequest::new(request.method().as_str(), request.uri().path())
        .request_id(request_id.clone())
        .user(user);

    let guard = middleware.connect(&audit);
    request.extensions_mut().insert(audit);
    let mut response = next.run(request).await;
    drop(guard);

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

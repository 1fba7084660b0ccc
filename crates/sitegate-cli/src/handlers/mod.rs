//! Storage API request handlers

pub mod bucket;
pub mod object;
pub mod sites;

pub use bucket::*;
pub use object::*;
pub use sites::*;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope shared by the JSON endpoints
#[derive(Serialize)]
struct Envelope<T: Serialize> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// `{"status":"ok","data":...}`
pub(crate) fn ok_data<T: Serialize>(data: T) -> Response {
    Json(Envelope {
        status: "ok",
        msg: None,
        data: Some(data),
    })
    .into_response()
}

/// `{"status":"ok","msg":...}`, with optional data
pub(crate) fn ok_msg<T: Serialize>(msg: impl Into<String>, data: Option<T>) -> Response {
    Json(Envelope {
        status: "ok",
        msg: Some(msg.into()),
        data,
    })
    .into_response()
}

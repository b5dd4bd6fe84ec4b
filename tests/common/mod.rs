//! Shared fixtures for integration tests.
//!
//! A small in-memory `users` group exercising path parameters, query
//! parameters, request bodies and error statuses.

#![allow(dead_code)]

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use routebook::{
    ApiRouter, Endpoint, Example, HandlerGroup, Handlers, Metrics, QueryParams, Route, Status,
    SystemGroup, example_of,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExampleUser {
    #[serde(rename = "ID")]
    pub id: u64,
    pub name: String,
}

impl Example for ExampleUser {
    fn example() -> Self {
        ExampleUser {
            id: 1,
            name: "a".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListQuery {
    pub name: String,
    pub limit: u32,
}

impl Example for ListQuery {
    fn example() -> Self {
        ListQuery {
            name: "a".to_string(),
            limit: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
}

impl Example for NewUser {
    fn example() -> Self {
        NewUser {
            name: "a".to_string(),
        }
    }
}

/// Fixed user directory: ids 1 and 2.
pub struct UsersGroup;

fn directory() -> Vec<ExampleUser> {
    vec![
        ExampleUser {
            id: 1,
            name: "a".to_string(),
        },
        ExampleUser {
            id: 2,
            name: "b".to_string(),
        },
    ]
}

fn list(_req: &Request, query: &QueryParams) -> Status {
    let names = query.get_all("name");
    let users: Vec<ExampleUser> = directory()
        .into_iter()
        .filter(|u| names.is_empty() || names.contains(&u.name))
        .collect();
    Status::ok(StatusCode::OK, users)
}

fn get(req: &Request, _query: &QueryParams) -> Status {
    let id = req
        .uri()
        .path()
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u64>().ok());
    match id.and_then(|id| directory().into_iter().find(|u| u.id == id)) {
        Some(user) => Status::ok(StatusCode::OK, user),
        None => Status::err(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn create(req: Request, _query: QueryParams) -> Status {
    let bytes = match to_bytes(req.into_body(), 1024).await {
        Ok(bytes) => bytes,
        Err(e) => return Status::err(StatusCode::BAD_REQUEST, e),
    };
    match serde_json::from_slice::<NewUser>(&bytes) {
        Ok(new) => Status::ok(
            StatusCode::CREATED,
            ExampleUser {
                id: 3,
                name: new.name,
            },
        ),
        Err(e) => Status::err(StatusCode::BAD_REQUEST, e),
    }
}

impl HandlerGroup for UsersGroup {
    fn name(&self) -> &str {
        "users"
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::new("List", Method::GET, "", Endpoint::new(list))
                .with_description("List users, optionally filtered by name.")
                .with_params(example_of::<ListQuery>())
                .with_returns(Arc::new(serde_json::json!([{"ID": 1, "Name": "a"}]))),
            Route::new("Get", Method::GET, "/{id}", Endpoint::new(get))
                .with_description("Fetch one user by id.")
                .with_returns(example_of::<ExampleUser>()),
            Route::new("Create", Method::POST, "", Endpoint::from_async(create))
                .with_description("Create a user.")
                .with_accepts(example_of::<NewUser>())
                .with_returns(example_of::<ExampleUser>()),
            Route::new(
                "Numbers",
                Method::GET,
                "numbers",
                Endpoint::new(|_, _| Status::ok(StatusCode::OK, vec![1, 2, 3])),
            ),
        ]
    }
}

/// Users and system groups with a shared metrics handle.
pub fn create_api() -> ApiRouter {
    Handlers::new()
        .add(UsersGroup)
        .add(SystemGroup::new())
        .assemble(Arc::new(Metrics::new()))
        .expect("fixture route table is valid")
}

pub fn create_test_server(api: ApiRouter) -> TestServer {
    TestServer::new(api.into_router()).expect("Failed to create test server")
}

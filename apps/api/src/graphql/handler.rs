//! GraphQL HTTP handler
//!
//! Every request gets its own [`Loaders`] registry, attached as request data
//! and dropped when the response has been produced.

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};

use crate::loaders::{LoaderConfig, Loaders};
use crate::store::SharedStore;

use super::schema::{build_schema, StorefrontSchema};

/// Shared state for the GraphQL endpoint
#[derive(Clone)]
pub struct GraphQLState {
    pub schema: StorefrontSchema,
    pub store: SharedStore,
    pub loader_config: LoaderConfig,
}

impl GraphQLState {
    pub fn new(store: SharedStore, loader_config: LoaderConfig) -> Self {
        Self {
            schema: build_schema(store.clone()),
            store,
            loader_config,
        }
    }
}

/// Create the GraphQL router
///
/// # Routes
/// - `POST /` - Execute a query
/// - `GET /` - GraphQL Playground (only when `playground` is set)
pub fn graphql_router(state: GraphQLState, playground: bool) -> Router {
    let route = if playground {
        get(graphql_playground).post(graphql_handler)
    } else {
        post(graphql_handler)
    };

    Router::new().route("/", route).with_state(state)
}

/// Execute a GraphQL request with a fresh loader registry
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let loaders = Loaders::with_config(state.store.clone(), state.loader_config);
    let request = req.into_inner().data(loaders);

    state.schema.execute(request).await.into()
}

async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

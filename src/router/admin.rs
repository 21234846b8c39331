use crate::{
    auth::{Auth, AuthError},
    document::Document,
    error::ShelfError,
    ids::{parse_id_list, DocumentId, FolderId},
    library::{Library, LibraryInput},
    state::Shelf,
};
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Deserialize;
use std::sync::Arc;

pub(super) fn admin_router(shelf: Shelf, auth: Auth) -> Router {
    let auth = Arc::new(auth);

    let router = Router::new()
        .route("/order", get(combined_order))
        .route("/folders/:id/order", get(current_order).post(update_order))
        .route("/libraries", get(list_libraries).post(create_library))
        .route(
            "/libraries/:id",
            get(get_library).put(update_library).delete(delete_library),
        )
        .layer(middleware::from_fn_with_state(auth, token_check))
        .with_state(shelf);

    Router::new().nest("/admin", router)
}

/// Either a JSON array or the comma joined form sent by older clients.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdsInput {
    List(Vec<DocumentId>),
    Joined(String),
}

#[derive(Debug, Deserialize)]
struct OrderRequest {
    ids: IdsInput,
}

impl OrderRequest {
    fn ids(self) -> Result<Vec<DocumentId>, ShelfError> {
        match self.ids {
            IdsInput::List(ids) => Ok(ids),
            IdsInput::Joined(joined) => parse_id_list(&joined),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CombinedOrderQuery {
    /// Comma joined folder ids
    folders: String,
}

/// Read only view over several folders, sorted by their folder local order values.
async fn combined_order(
    state: axum::extract::State<Shelf>,
    query: axum::extract::Query<CombinedOrderQuery>,
) -> Result<Json<Vec<Document>>, ShelfError> {
    let folders = parse_id_list(&query.folders)?;
    let documents = state
        .order_manager()
        .get_ordered_documents_across(&folders)
        .await?;
    Ok(Json(documents))
}

async fn current_order(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<FolderId>,
) -> Result<Json<Vec<Document>>, ShelfError> {
    let documents = state.order_manager().get_ordered_documents(id.0).await?;
    Ok(Json(documents))
}

async fn update_order(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<FolderId>,
    request: Json<OrderRequest>,
) -> Result<Json<Vec<Document>>, ShelfError> {
    let ids = request.0.ids()?;
    let manager = state.order_manager();
    manager.update_folder_order(id.0, &ids).await?;
    Ok(Json(manager.get_ordered_documents(id.0).await?))
}

async fn list_libraries(
    state: axum::extract::State<Shelf>,
) -> Result<Json<Vec<Library>>, ShelfError> {
    Ok(Json(state.libraries.list().await?))
}

async fn get_library(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<i64>,
) -> Result<Json<Library>, ShelfError> {
    state
        .libraries
        .get(id.0)
        .await?
        .map(Json)
        .ok_or_else(|| ShelfError::NotFound(format!("library {}", id.0)))
}

async fn create_library(
    state: axum::extract::State<Shelf>,
    input: Json<LibraryInput>,
) -> Result<(StatusCode, Json<Library>), ShelfError> {
    let input = input.0.validate()?;
    let library = state.libraries.insert(&input).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

async fn update_library(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<i64>,
    input: Json<LibraryInput>,
) -> Result<Json<Library>, ShelfError> {
    let input = input.0.validate()?;
    state
        .libraries
        .update(id.0, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ShelfError::NotFound(format!("library {}", id.0)))
}

async fn delete_library(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<i64>,
) -> Result<StatusCode, ShelfError> {
    if state.libraries.remove(id.0).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ShelfError::NotFound(format!("library {}", id.0)))
    }
}

async fn token_check(
    auth: axum::extract::State<Arc<Auth>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, ShelfError> {
    let Some(TypedHeader(authorization)) = bearer else {
        return Err(AuthError::MissingToken.into());
    };

    if !auth.verify_token(authorization.token()) {
        return Err(AuthError::InvalidToken.into());
    }

    let response: Response = next.run(req).await;

    Ok(response)
}

use crate::{
    aggregate::{AggregateOptions, Aggregated},
    auth::Auth,
    document::{Limit, OrderBy, OrderDirection},
    error::ShelfError,
    folder::{folder_path, tree_depth, FolderNode},
    ids::{parse_id_list, FolderId},
    library::{render_library, AccordionStates, RenderedLibrary},
    state::Shelf,
};
use axum::{extract::Query, http::Method, routing::get, Json, Router};
use axum_macros::debug_handler;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use self::admin::admin_router;

mod admin;

/// Deepest nesting returned as JSON. Serialization recurses once per level.
const MAX_RENDER_DEPTH: usize = 256;

fn check_render_depth(depth: usize) -> Result<(), ShelfError> {
    if depth > MAX_RENDER_DEPTH {
        return Err(ShelfError::TooDeep(depth));
    }
    Ok(())
}

pub fn router(shelf: Shelf, auth: Option<Auth>) -> Router {
    let router = public_router(shelf.clone());

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    if let Some(auth) = auth {
        router.merge(admin_router(shelf, auth))
    } else {
        router
    }
    .layer(TraceLayer::new_for_http())
    .layer(cors)
}

fn public_router(shelf: Shelf) -> Router {
    Router::new()
        .route("/folders", get(folder_tree))
        .route("/folders/:id/path", get(folder_path_of))
        .route("/folders/:id/documents", get(folder_documents))
        .route("/libraries/:id", get(library))
        .with_state(shelf)
}

/// Query string of document listings. Anything left out comes from the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentsQuery {
    pub order_by: Option<OrderBy>,
    pub order: Option<OrderDirection>,
    pub limit: Option<i64>,
    pub include_subfolders: Option<bool>,
    pub group_by_folder: Option<bool>,
    /// Comma joined folder ids
    pub exclude: Option<String>,
}

impl DocumentsQuery {
    pub fn into_options(self, defaults: &AggregateOptions) -> Result<AggregateOptions, ShelfError> {
        let mut options = defaults.clone();

        let DocumentsQuery {
            order_by,
            order,
            limit,
            include_subfolders,
            group_by_folder,
            exclude,
        } = self;

        if let Some(order_by) = order_by {
            options.query.order_by = order_by;
        }
        if let Some(order) = order {
            options.query.order = order;
        }
        if let Some(limit) = limit {
            options.query.limit = Limit::from(limit);
        }
        if let Some(include_subfolders) = include_subfolders {
            options.include_subfolders = include_subfolders;
        }
        if let Some(group_by_folder) = group_by_folder {
            options.group_by_folder = group_by_folder;
        }
        if let Some(exclude) = exclude {
            options.query.exclude_folder_ids = parse_id_list(&exclude)?.into_iter().collect();
        }

        Ok(options)
    }
}

#[derive(Debug, Serialize)]
pub struct FolderPath {
    pub id: FolderId,
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    /// Accordion states in `"12:open,13:closed"` form, overriding the saved ones
    pub accordion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibraryPage {
    pub site_title: Option<String>,
    /// Effective accordion states in token form, for clients that persist them
    pub accordion_tokens: String,
    #[serde(flatten)]
    pub library: RenderedLibrary,
}

pub async fn folder_tree(
    state: axum::extract::State<Shelf>,
) -> Result<Json<Vec<FolderNode>>, ShelfError> {
    let tree = state.aggregator().folder_tree().await?;
    check_render_depth(tree_depth(&tree))?;
    Ok(Json(tree))
}

pub async fn folder_path_of(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<FolderId>,
) -> Result<Json<FolderPath>, ShelfError> {
    let tree = state.aggregator().folder_tree().await?;
    Ok(Json(FolderPath {
        id: id.0,
        path: folder_path(&tree, id.0),
    }))
}

#[debug_handler]
pub async fn folder_documents(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<FolderId>,
    query: Query<DocumentsQuery>,
) -> Result<Json<Aggregated>, ShelfError> {
    let options = query.0.into_options(&state.defaults)?;
    let documents = state
        .aggregator()
        .get_documents_recursive(id.0, &options)
        .await?;
    if documents.is_empty() {
        debug!("No documents for folder {}", id.0);
    }
    check_render_depth(documents.depth())?;
    Ok(Json(documents))
}

pub async fn library(
    state: axum::extract::State<Shelf>,
    id: axum::extract::Path<i64>,
    query: Query<LibraryQuery>,
) -> Result<Json<LibraryPage>, ShelfError> {
    let Some(mut library) = state.libraries.get(id.0).await? else {
        return Err(ShelfError::NotFound(format!("library {}", id.0)));
    };

    if let Some(tokens) = &query.accordion {
        let accordion = &mut library.settings.accordion;
        let overrides = AccordionStates::parse_tokens(tokens, accordion.default_open);
        for (folder, state) in overrides.folders {
            accordion.set(folder, state);
        }
    }

    info!("Rendering library {} ({})", library.id, library.title);

    let accordion_tokens = library.settings.accordion.to_tokens();
    let library = render_library(&state.aggregator(), library).await?;
    for section in library.sections.iter() {
        check_render_depth(section.content.depth())?;
    }

    Ok(Json(LibraryPage {
        site_title: state.title.clone(),
        accordion_tokens,
        library,
    }))
}

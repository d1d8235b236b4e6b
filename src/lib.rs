#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::as_conversions,
    clippy::case_sensitive_file_extension_comparisons,
    clippy::cognitive_complexity,
    clippy::unwrap_used,
    clippy::branches_sharing_code,
    clippy::fallible_impl_from,
    clippy::filetype_is_file,
    clippy::filter_map_next,
    clippy::flat_map_option,
    clippy::fn_params_excessive_bools,
    clippy::format_push_string,
    clippy::from_iter_instead_of_collect,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::implicit_clone,
    clippy::imprecise_flops,
    clippy::index_refutable_slice,
    clippy::inefficient_to_string,
    clippy::items_after_statements,
    clippy::iter_not_returning_iterator,
    clippy::iter_on_empty_collections,
    clippy::iter_on_single_items,
    clippy::iter_with_drain,
    clippy::linkedlist,
    clippy::macro_use_imports,
    clippy::manual_assert,
    clippy::manual_clamp,
    clippy::manual_instant_elapsed,
    clippy::manual_let_else,
    clippy::manual_ok_or,
    clippy::manual_string_new,
    clippy::map_err_ignore
)]
#![doc = include_str!("../README.md")]

use std::{
    future::{Future, IntoFuture},
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use color_eyre::{eyre::Context, Report};
use futures::FutureExt;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::MakeRequestUuid,
    trace::TraceLayer,
    ServiceBuilderExt,
};
use tracing::{info, info_span, warn, Span};
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    mailer::{LogMailer, Mailer, SmtpMailer},
    routes::{
        expenses::{create_expense, get_one_expense, list_expenses, patch_expense, remove_expense},
        fallback,
        healthcheck::health_check,
        index,
        login::{login, logout},
        register::{sign_up, verify_email},
        reset::{forgot_password, reset_password, test_reset_token},
        user::{get_me, get_one_user, list_users, patch_user, remove_user},
    },
    settings::Config,
    token::Tokens,
};

mod database;
mod error_handling;
mod extract;
pub mod mailer;
mod middlewares;
mod openapi;
mod routes;
pub mod settings;
mod token;
pub mod trace;
mod types;

/// The mailer matching the config: SMTP if configured, otherwise the log
pub fn mailer(config: &Config) -> Result<Arc<dyn Mailer>, Report> {
    match &config.mail {
        Some(mail) => Ok(Arc::new(SmtpMailer::new(mail)?)),
        None => {
            warn!("No mail relay configured, mails are only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Sets up the complete application
///
/// Binds the listener, connects to the database and brings it up to
/// date. Returns the address actually bound (relevant for port 0) and
/// the server future, which finishes after Ctrl-C.
pub async fn create_app(
    config: Config,
    mailer: Arc<dyn Mailer>,
) -> Result<(SocketAddr, impl Future<Output = Result<(), Report>> + Send), Report> {
    let listener = TcpListener::bind((config.app.listen_on, config.app.port))
        .await
        .wrap_err("Binding the listener")?;
    let addr = listener.local_addr()?;

    info!("Listening on http://{}", addr);

    let pool = database::connect(&config.database).await?;
    database::migrate(&pool).await?;

    let tokens = Arc::new(Tokens::new(&config.auth));
    let app = router(Arc::new(config), pool, tokens, mailer);

    Ok((
        addr,
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future()
            .map(|r| r.map_err(Into::into)),
    ))
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// One span per request, without headers so no token ends up in the log
fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Whether browsers on `origin` may call the API with credentials
fn origin_allowed(config: &Config, origin: &str) -> bool {
    let Ok(origin) = Url::parse(origin) else {
        return false;
    };

    if config.app.allowed_origins.contains(&origin) {
        true
    } else {
        config.app.allow_localhost && origin.host_str() == Some("localhost")
    }
}

/// All routes with their middlewares
pub(crate) fn router(
    config: Arc<Config>,
    pool: PgPool,
    tokens: Arc<Tokens>,
    mailer: Arc<dyn Mailer>,
) -> Router {
    let cors_config = Arc::clone(&config);

    Router::new()
        .route("/", get(index))
        .route("/health_check", get(health_check))
        .route("/users", get(list_users))
        .route("/users/me", get(get_me))
        .route("/users/sign_up", post(sign_up))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/forgot_password", post(forgot_password))
        .route(
            "/users/reset_password/:slug",
            get(test_reset_token).post(reset_password),
        )
        .route("/users/verify_email/:slug", get(verify_email))
        .route(
            "/users/:id",
            get(get_one_user).patch(patch_user).delete(remove_user),
        )
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(get_one_expense)
                .patch(patch_expense)
                .delete(remove_expense),
        )
        .merge(SwaggerUi::new("/reference").url("/doc", openapi::openapi(&config.auth.cookie)))
        .fallback(fallback)
        .layer(
            ServiceBuilder::new()
                .set_x_request_id(MakeRequestUuid)
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .propagate_x_request_id()
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                        .allow_origin(AllowOrigin::predicate(move |header, _request| {
                            // We don't allow non utf-origins at the moment
                            header
                                .to_str()
                                .is_ok_and(|origin| origin_allowed(&cors_config, origin))
                        }))
                        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                        .allow_credentials(true),
                )
                .layer(Extension(config))
                .layer(Extension(pool))
                .layer(Extension(tokens))
                .layer(Extension(mailer)),
        )
}

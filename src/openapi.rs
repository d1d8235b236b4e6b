//! The OpenAPI description served at `/doc`

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    OpenApi,
};

use crate::{
    database::{
        auth::Credentials,
        expenses::{Expense, ExpenseCreation, ExpenseUpdate},
        User, UserCreation, UserUpdate,
    },
    error_handling::Message,
    routes::{
        self,
        login::LoginResponse,
        reset::{PasswordReset, ResetRequest, TokenValidity},
    },
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Spendwise API", description = "Users and their expenses"),
    paths(
        routes::index,
        routes::healthcheck::health_check,
        routes::register::sign_up,
        routes::register::verify_email,
        routes::login::login,
        routes::login::logout,
        routes::user::list_users,
        routes::user::get_me,
        routes::user::get_one_user,
        routes::user::patch_user,
        routes::user::remove_user,
        routes::reset::forgot_password,
        routes::reset::test_reset_token,
        routes::reset::reset_password,
        routes::expenses::list_expenses,
        routes::expenses::create_expense,
        routes::expenses::get_one_expense,
        routes::expenses::patch_expense,
        routes::expenses::remove_expense,
    ),
    components(schemas(
        Message,
        User,
        UserCreation,
        UserUpdate,
        Credentials,
        LoginResponse,
        ResetRequest,
        PasswordReset,
        TokenValidity,
        Expense,
        ExpenseCreation,
        ExpenseUpdate,
    )),
    tags(
        (name = "index", description = "Reachability"),
        (name = "users", description = "Accounts, login and password resets"),
        (name = "expenses", description = "Expenses of the logged in user"),
    )
)]
struct ApiDoc;

/// The document including both ways to send the access token
pub(crate) fn openapi(cookie_name: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let components = doc.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
        "cookie_auth",
        SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(cookie_name))),
    );
    components.add_security_scheme(
        "bearer_auth",
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );

    doc
}

// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.

pub mod index;
pub mod session;
pub mod users;

use account_auth_common::CredentialsForm;
use axum::{extract::rejection::FormRejection, Form};
use tracing::debug;

/// Form fields, or none when the body is absent or not form-encoded
pub(crate) fn form_fields(form: Result<Form<CredentialsForm>, FormRejection>) -> CredentialsForm {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!(%rejection, "unreadable form body");
            CredentialsForm::default()
        },
    }
}

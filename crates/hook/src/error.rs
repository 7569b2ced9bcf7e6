use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("import error: {0}")]
    Core(#[from] importmail_core::CoreError),

    #[error("mail error: {0}")]
    Mail(#[from] importmail_notify::MailError),
}

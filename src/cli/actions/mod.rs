pub mod cleanup;
pub mod codes;
pub mod dashboard;
pub mod gate;
pub mod session;

use crate::cli::globals::GlobalArgs;
use anyhow::Result;

#[derive(Debug)]
pub enum Action {
    Login(session::LoginArgs),
    Status(GlobalArgs),
    Logout(GlobalArgs),
    Usage(codes::UsageArgs),
    Codes,
    Cleanup(GlobalArgs),
    Gate(gate::Args),
    Dashboard(dashboard::Args),
}

impl Action {
    /// Run the action to completion.
    ///
    /// # Errors
    /// Returns an error if access is denied or output cannot be produced.
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Login(args) => session::login(args).await,
            Self::Status(globals) => session::status(&globals),
            Self::Logout(globals) => {
                session::logout(&globals);
                Ok(())
            }
            Self::Usage(args) => codes::usage(&args),
            Self::Codes => codes::list(),
            Self::Cleanup(globals) => cleanup::execute(&globals),
            Self::Gate(args) => gate::execute(args).await,
            Self::Dashboard(args) => dashboard::execute(args).await,
        }
    }
}

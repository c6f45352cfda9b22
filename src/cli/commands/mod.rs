mod init;
mod user;

pub use init::{cmd_init, cmd_migrate};
pub use user::cmd_create_user;

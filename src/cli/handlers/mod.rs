//! Command handlers
//!
//! Each handler locates the desk, performs one command and prints the result
//! through the [`OutputFormatter`](crate::cli::OutputFormatter).

mod category;
mod common;
mod init;
mod sync;
mod tickets;

pub use category::handle_category_command;
pub use common::{HandlerContext, find_project_root};
pub use init::handle_init;
pub use sync::{handle_pull_command, handle_push_command, handle_sync_command};
pub use tickets::{
    EditParams, NewParams, handle_comment_command, handle_edit_command, handle_list_command,
    handle_new_command, handle_show_command, handle_status_command, parse_custom_fields,
};

//! Command handlers module for the DropFile server.
//!
//! Each handler runs one storage operation for the session's user and turns
//! the outcome into a response envelope. Handlers are synchronous and are
//! expected to run on a blocking worker.

use std::io::Read;

use crate::error::{ProtocolError, ServerError};
use crate::protocol::responses::{CREATED, OK, Response};
use crate::protocol::{Command, CommandResult};
use crate::storage::{Listing, StorageOperations};

/// Dispatches a storage command to its handler.
///
/// `identify`, `upload` and `quit` depend on session state or on bytes that
/// follow the request line, so the session handles them itself.
pub fn handle_command(
    user_id: &str,
    command: Command,
    storage: &StorageOperations,
) -> CommandResult {
    match command {
        Command::List {
            folder_path,
            show_structure,
        } => handle_cmd_list(user_id, folder_path.as_deref(), show_structure, storage),
        Command::CreateDirectory {
            folder_path,
            directory_name,
        } => handle_cmd_create_directory(user_id, &folder_path, &directory_name, storage),
        Command::Delete {
            folder_path,
            item_name,
        } => handle_cmd_delete(user_id, &folder_path, &item_name, storage),
        Command::Rename {
            folder_path,
            old_name,
            new_name,
            item_type,
        } => handle_cmd_rename(user_id, &folder_path, &old_name, &new_name, &item_type, storage),
        Command::Move {
            current_path,
            destination_path,
        } => handle_cmd_move(user_id, &current_path, &destination_path, storage),
        Command::Identify { .. } | Command::Upload { .. } | Command::Quit => {
            CommandResult::failure(ServerError::from(ProtocolError::MalformedRequest(
                "command is not a storage operation".into(),
            )))
        }
    }
}

/// Handles an upload whose body has already been read from the connection.
pub fn handle_upload<R: Read>(
    user_id: &str,
    original_filename: &str,
    content: R,
    storage: &StorageOperations,
) -> CommandResult {
    match storage.store(user_id, original_filename, content) {
        Ok(result) => CommandResult::success(
            Response::ok(
                CREATED,
                format!("File uploaded successfully: {}", result.virtual_path),
            )
            .with_data(&result),
        ),
        Err(e) => CommandResult::failure(e.into()),
    }
}

fn handle_cmd_list(
    user_id: &str,
    folder_path: Option<&str>,
    show_structure: bool,
    storage: &StorageOperations,
) -> CommandResult {
    match storage.list(user_id, folder_path, show_structure) {
        Ok(listing) => {
            let message = match &listing {
                Listing::Flat(list) => format!("{} entries", list.entries.len()),
                Listing::Tree(_) => "Directory structure".to_string(),
            };
            CommandResult::success(Response::ok(OK, message).with_data(&listing))
        }
        Err(e) => CommandResult::failure(e.into()),
    }
}

fn handle_cmd_create_directory(
    user_id: &str,
    folder_path: &str,
    directory_name: &str,
    storage: &StorageOperations,
) -> CommandResult {
    match storage.create_directory(user_id, folder_path, directory_name) {
        Ok(result) => CommandResult::success(
            Response::ok(
                CREATED,
                format!("Directory created successfully: {}", result.virtual_path),
            )
            .with_data(&result),
        ),
        Err(e) => CommandResult::failure(e.into()),
    }
}

fn handle_cmd_delete(
    user_id: &str,
    folder_path: &str,
    item_name: &str,
    storage: &StorageOperations,
) -> CommandResult {
    match storage.delete(user_id, folder_path, item_name) {
        Ok(result) => CommandResult::success(
            Response::ok(OK, format!("Item deleted successfully: {}", result.virtual_path))
                .with_data(&result),
        ),
        Err(e) => CommandResult::failure(e.into()),
    }
}

fn handle_cmd_rename(
    user_id: &str,
    folder_path: &str,
    old_name: &str,
    new_name: &str,
    item_type: &str,
    storage: &StorageOperations,
) -> CommandResult {
    match storage.rename(user_id, folder_path, old_name, new_name, item_type) {
        Ok(result) => CommandResult::success(
            Response::ok(
                OK,
                format!(
                    "{} renamed successfully: {} -> {}",
                    result.item_type, result.from, result.to
                ),
            )
            .with_data(&result),
        ),
        Err(e) => CommandResult::failure(e.into()),
    }
}

fn handle_cmd_move(
    user_id: &str,
    current_path: &str,
    destination_path: &str,
    storage: &StorageOperations,
) -> CommandResult {
    match storage.move_item(user_id, current_path, destination_path) {
        Ok(result) => CommandResult::success(
            Response::ok(OK, format!("Moved successfully: {} -> {}", result.from, result.to))
                .with_data(&result),
        ),
        Err(e) => CommandResult::failure(e.into()),
    }
}

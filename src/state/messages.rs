/// Messages left by the worker in a project's `messages/` directory
///
/// Each message is a small text file. The client shows it once and then
/// deletes it.

use std::fs;
use std::path::Path;

use crate::files;

/// Read and remove every pending message, oldest name first.
///
/// A message is returned only once it has been removed. Files that cannot
/// be read or removed are left in place for the next call.
pub fn take_messages(messages_dir: &Path) -> Vec<String> {
    let names = match files::ls(messages_dir) {
        Ok(names) => names,
        Err(err) => {
            tracing::debug!("no messages in {}: {}", messages_dir.display(), err);
            return Vec::new();
        }
    };

    let mut messages = Vec::new();
    for name in names {
        let path = messages_dir.join(&name);
        match fs::read_to_string(&path) {
            Ok(text) => match fs::remove_file(&path) {
                Ok(()) => messages.push(text),
                Err(err) => tracing::warn!("failed to remove message {}: {}", path.display(), err),
            },
            Err(err) => tracing::warn!("failed to read message {}: {}", path.display(), err),
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_take_messages_consumes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("002.txt"), "second").unwrap();
        fs::write(dir.path().join("001.txt"), "first").unwrap();
        fs::write(dir.path().join(".003.txt.tmp"), "partial").unwrap();

        assert_eq!(take_messages(dir.path()), vec!["first", "second"]);
        assert!(take_messages(dir.path()).is_empty());
        assert!(dir.path().join(".003.txt.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unremovable_message_is_not_returned() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let messages = dir.path().join("messages");
        fs::create_dir(&messages).unwrap();
        fs::write(messages.join("001.txt"), "epoch 1").unwrap();
        fs::set_permissions(&messages, fs::Permissions::from_mode(0o555)).unwrap();

        let taken = take_messages(&messages);
        let still_there = messages.join("001.txt").exists();
        fs::set_permissions(&messages, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can remove the file regardless of permissions
        if still_there {
            assert!(taken.is_empty());
            assert_eq!(take_messages(&messages), vec!["epoch 1"]);
        } else {
            assert_eq!(taken, vec!["epoch 1"]);
        }
        assert!(take_messages(&messages).is_empty());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(take_messages(&dir.path().join("messages")).is_empty());
    }
}
